use axum::{extract::State, routing::{get, post}, Json, Router};

use kiosk_core::{KioskSnapshot, TapPoint};

use crate::error::Result;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/kiosk", get(snapshot))
        .route("/kiosk/tap", post(tap))
        .route("/kiosk/pause", post(pause))
        .route("/kiosk/resume", post(resume))
}

async fn snapshot(State(state): State<AppState>) -> Json<KioskSnapshot> {
    Json(state.kiosk.snapshot())
}

async fn tap(State(state): State<AppState>, Json(point): Json<TapPoint>) -> Result<Json<KioskSnapshot>> {
    Ok(Json(state.kiosk.tap(point).await?))
}

async fn pause(State(state): State<AppState>) -> Result<Json<KioskSnapshot>> {
    Ok(Json(state.kiosk.pause().await?))
}

async fn resume(State(state): State<AppState>) -> Result<Json<KioskSnapshot>> {
    Ok(Json(state.kiosk.resume().await?))
}
