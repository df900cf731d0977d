//! 旧版 `/fitness-coach` 兼容入口
//!
//! 老客户端把训练和营养请求都发到这里，按请求体形状转交给对应场景的
//! 处理逻辑，提示词和规范化规则不在这里重复

use axum::{extract::State, response::Response};

use crate::coach::dispatch::{classify, LegacyScenario};
use crate::gateway::handlers::{
    bad_request, into_payload, nutrition::coach_nutrition, workout::coach_workout, JsonPayload,
};
use crate::gateway::state::AppState;

/// POST /fitness-coach
pub async fn handle_fitness_coach(State(state): State<AppState>, payload: JsonPayload) -> Response {
    let payload = match into_payload(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match classify(&payload) {
        Ok(LegacyScenario::Workout) => {
            tracing::debug!("legacy request routed to workout coach");
            coach_workout(&state, &payload).await
        }
        Ok(LegacyScenario::Nutrition) => {
            tracing::debug!("legacy request routed to nutrition coach");
            coach_nutrition(&state, &payload).await
        }
        Err(e) => bad_request(e.to_string()),
    }
}
