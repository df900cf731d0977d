//! 训练教练处理器

use axum::{extract::State, response::Response};
use serde_json::Value;

use crate::coach::dispatch::parse_workout_request;
use crate::gateway::handlers::{bad_request, into_payload, respond, JsonPayload};
use crate::gateway::state::AppState;

/// POST /workout-coach
pub async fn handle_workout_coach(State(state): State<AppState>, payload: JsonPayload) -> Response {
    match into_payload(payload) {
        Ok(payload) => coach_workout(&state, &payload).await,
        Err(response) => response,
    }
}

/// 训练场景的共享处理逻辑，旧版入口直接调用
pub(crate) async fn coach_workout(state: &AppState, payload: &Value) -> Response {
    match parse_workout_request(payload) {
        Ok(request) => respond(state, request).await,
        Err(e) => bad_request(e.to_string()),
    }
}
