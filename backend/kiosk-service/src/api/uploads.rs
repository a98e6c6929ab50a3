use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;

use kiosk_core::MediaKind;

use crate::clients::MediaFile;
use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/uploads",
        post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Json<UploadResponse>> {
    let (file, _) = read_media_form(multipart).await?;
    let url = state.content.upload(file).await?;
    Ok(Json(UploadResponse { url }))
}

/// Read a `file` part and an optional `kind` text part.
pub(super) async fn read_media_form(mut multipart: Multipart) -> Result<(MediaFile, Option<MediaKind>)> {
    let mut file = None;
    let mut kind = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                file = Some(MediaFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("kind") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                let parsed = MediaKind::parse(raw.trim())
                    .ok_or_else(|| AppError::Validation(format!("Unknown media kind: {raw}")))?;
                kind = Some(parsed);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("Missing file field".to_string()))?;
    Ok((file, kind))
}
