use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use kiosk_core::{Post, PostDraft, PostPatch};

use super::uploads::read_media_form;
use crate::error::Result;
use crate::AppState;

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/posts/:id/media",
            post(attach_media).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.content.list_posts().await?))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Post>> {
    Ok(Json(state.content.get_post(&id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<Post>)> {
    let post = state.content.create_post(draft).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<PostPatch>,
) -> Result<Json<Post>> {
    Ok(Json(state.content.update_post(&id, patch).await?))
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.content.delete_post(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn attach_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Post>> {
    let (file, kind) = read_media_form(multipart).await?;
    Ok(Json(state.content.attach_media(&id, kind, file).await?))
}
