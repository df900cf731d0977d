//! HTTP 请求处理器

pub mod fitness;
pub mod health;
pub mod nutrition;
pub mod nutrition_image;
pub mod workout;

pub use fitness::handle_fitness_coach;
pub use health::handle_health;
pub use nutrition::handle_nutrition_coach;
pub use nutrition_image::handle_nutrition_image;
pub use workout::handle_workout_coach;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::coach::service::CoachError;
use crate::coach::{CoachRequest, Scenario};
use crate::gateway::state::AppState;

const MEAL_UNAVAILABLE: &str = "Failed to estimate meal nutrition. Please try again.";
const MEAL_INVALID_OUTPUT: &str = "Model returned an invalid meal estimate";
const WORKOUT_UNAVAILABLE: &str =
    "Sorry, I couldn't reach your workout coach right now. Please try again in a moment.";
const NUTRITION_UNAVAILABLE: &str =
    "Sorry, I couldn't reach your nutrition coach right now. Please try again in a moment.";

/// 请求体：JSON 解析失败时由处理器转换为 400
pub type JsonPayload = Result<Json<Value>, JsonRejection>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>, raw: Option<String>) -> Response {
    let body = ErrorResponse {
        error: error.into(),
        raw,
    };
    (status, Json(body)).into_response()
}

/// 400：请求校验失败，不会调用上游
pub(crate) fn bad_request(error: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, error, None)
}

/// 取出请求体，无法解析的 JSON 返回 400，超出大小限制保持 413
pub(crate) fn into_payload(payload: JsonPayload) -> Result<Value, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            tracing::debug!(%status, "rejected request body: {}", rejection.body_text());
            Err(error_response(status, rejection.body_text(), None))
        }
    }
}

/// 所有场景共用的执行与响应映射
pub(crate) async fn respond(state: &AppState, request: CoachRequest) -> Response {
    let scenario = request.scenario();

    match state.coach().run(&request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(CoachError::Upstream(_)) => upstream_fallback(scenario),
        Err(CoachError::Normalize(e)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            MEAL_INVALID_OUTPUT,
            Some(e.raw().to_string()),
        ),
    }
}

/// 上游失败时的场景兜底响应，具体原因只写日志
fn upstream_fallback(scenario: Scenario) -> Response {
    let body: Value = match scenario {
        Scenario::ImageEstimate => json!({ "error": MEAL_UNAVAILABLE }),
        Scenario::Workout => json!({
            "error": "upstream_unavailable",
            "reply": WORKOUT_UNAVAILABLE,
            "plan": null,
        }),
        Scenario::Nutrition => json!({
            "error": "upstream_unavailable",
            "reply": NUTRITION_UNAVAILABLE,
            "macros": null,
        }),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
