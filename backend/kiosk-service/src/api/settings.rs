use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use kiosk_core::RotationSetting;

use crate::error::Result;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/settings/rotation", get(get_rotation).put(update_rotation))
}

#[derive(Debug, Serialize)]
pub struct RotationResponse {
    pub seconds: u64,
    pub interval_ms: u64,
}

impl From<RotationSetting> for RotationResponse {
    fn from(setting: RotationSetting) -> Self {
        Self {
            seconds: setting.seconds(),
            interval_ms: setting.interval_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRotationRequest {
    pub seconds: u64,
}

async fn get_rotation(State(state): State<AppState>) -> Json<RotationResponse> {
    Json(state.settings.rotation_interval().await.into())
}

async fn update_rotation(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRotationRequest>,
) -> Result<Json<RotationResponse>> {
    let setting = state.settings.save_rotation_seconds(payload.seconds).await?;
    state.kiosk.set_rotation_interval(setting.interval()).await?;
    Ok(Json(setting.into()))
}
