mod auth;
mod kiosk;
mod posts;
mod settings;
mod uploads;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::require_session;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let max_upload_bytes = state.max_upload_bytes;

    let protected = Router::new()
        .merge(posts::routes(max_upload_bytes))
        .merge(settings::routes())
        .merge(uploads::routes(max_upload_bytes))
        .merge(auth::session_routes())
        .route_layer(from_fn_with_state(state, require_session));

    Router::new()
        .merge(kiosk::routes())
        .merge(auth::routes())
        .merge(protected)
}
