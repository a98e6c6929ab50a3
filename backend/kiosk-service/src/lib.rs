//! Signage kiosk service
//!
//! Runs the kiosk display runtime and serves its snapshot, together with the
//! admin API for posts, settings and uploads.

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod kiosk;
pub mod middleware;
pub mod services;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::kiosk::KioskHandle;
use crate::services::{AuthService, ContentService, SessionStore, SettingsService};

#[derive(Clone)]
pub struct AppState {
    pub content: ContentService,
    pub settings: SettingsService,
    pub auth: AuthService,
    pub sessions: SessionStore,
    pub kiosk: KioskHandle,
    pub max_upload_bytes: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api::routes(state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
