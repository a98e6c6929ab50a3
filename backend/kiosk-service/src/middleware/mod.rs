mod auth;

pub use auth::{removal_cookie, require_session, session_cookie, CurrentSession, SESSION_COOKIE};
