//! 健康检查处理器

use axum::{extract::State, Json};
use serde::Serialize;

use crate::gateway::state::AppState;

/// 健康检查响应
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    ok: bool,
    status: &'static str,
    version: &'static str,
    upstream: String,
    has_api_key: bool,
    model: String,
    vision_model: String,
}

/// GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let coach = state.coach();
    let models = coach.models();

    Json(HealthResponse {
        ok: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream: coach.client().name().to_string(),
        has_api_key: coach.client().has_credentials(),
        model: models.text.clone(),
        vision_model: models.vision.clone(),
    })
}
