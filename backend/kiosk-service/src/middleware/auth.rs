use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use kiosk_core::SessionUser;

use crate::error::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "kiosk_session";

/// Authenticated dashboard session, inserted by [`require_session`]
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: String,
    pub user: SessionUser,
}

/// HTTP-only cookie without max-age, so it ends with the browser session.
pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let id = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let user = state.sessions.get(&id).ok_or(AppError::Unauthorized)?;
    request
        .extensions_mut()
        .insert(CurrentSession { id, user });

    Ok(next.run(request).await)
}
