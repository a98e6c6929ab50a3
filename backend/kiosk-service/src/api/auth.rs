use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use kiosk_core::SessionUser;

use crate::error::Result;
use crate::middleware::{removal_cookie, session_cookie, CurrentSession, SESSION_COOKIE};
use crate::AppState;

/// Routes reachable without a session
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Routes mounted behind the session check
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: SessionUser,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    let user = state.auth.authenticate(&payload.username, &payload.password)?;
    let session_id = state.sessions.create(user.clone());

    Ok((jar.add(session_cookie(session_id)), Json(LoginResponse { user })))
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.destroy(cookie.value()) {
            tracing::info!("Admin logged out");
        }
    }
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

async fn me(Extension(session): Extension<CurrentSession>) -> Json<SessionUser> {
    Json(session.user)
}
