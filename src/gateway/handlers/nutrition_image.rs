//! 餐食图片估算处理器

use axum::{extract::State, response::Response};

use crate::coach::dispatch::parse_image_request;
use crate::gateway::handlers::{bad_request, into_payload, respond, JsonPayload};
use crate::gateway::state::AppState;

/// POST /nutrition-image
pub async fn handle_nutrition_image(
    State(state): State<AppState>,
    payload: JsonPayload,
) -> Response {
    let payload = match into_payload(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match parse_image_request(&payload) {
        Ok(request) => respond(&state, request).await,
        Err(e) => bad_request(e.to_string()),
    }
}
