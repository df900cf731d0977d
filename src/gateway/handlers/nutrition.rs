//! 营养教练处理器

use axum::{extract::State, response::Response};
use serde_json::Value;

use crate::coach::dispatch::parse_nutrition_request;
use crate::gateway::handlers::{bad_request, into_payload, respond, JsonPayload};
use crate::gateway::state::AppState;

/// POST /nutrition-coach
pub async fn handle_nutrition_coach(
    State(state): State<AppState>,
    payload: JsonPayload,
) -> Response {
    match into_payload(payload) {
        Ok(payload) => coach_nutrition(&state, &payload).await,
        Err(response) => response,
    }
}

/// 营养场景的共享处理逻辑，空消息在调用上游之前返回 400
pub(crate) async fn coach_nutrition(state: &AppState, payload: &Value) -> Response {
    match parse_nutrition_request(payload) {
        Ok(request) => respond(state, request).await,
        Err(e) => bad_request(e.to_string()),
    }
}
