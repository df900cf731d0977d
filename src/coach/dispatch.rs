//! 请求分发
//!
//! 旧版 `/fitness-coach` 入口按请求体形状选择场景；各场景的请求体在这里
//! 校验并转换为 [`CoachRequest`]，校验失败的请求不会到达上游。

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use thiserror::Error;

use super::{ChatTurn, CoachRequest, TurnRole};

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// 旧版入口无法识别的请求体
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Invalid payload: expected either {{ messages: [{{ role, content }}], availableExercises? }} \
     for workout coaching or {{ message: string }} for nutrition coaching"
)]
pub struct InvalidPayload;

/// 请求体字段校验失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// 旧版入口能转交的场景，图片估算不在其中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyScenario {
    Workout,
    Nutrition,
}

/// 按请求体形状选择场景
///
/// `messages` 数组优先于 `message` 字符串，两者同时存在时归为训练场景
pub fn classify(payload: &Value) -> Result<LegacyScenario, InvalidPayload> {
    if payload.get("messages").is_some_and(Value::is_array) {
        return Ok(LegacyScenario::Workout);
    }
    if payload.get("message").is_some_and(Value::is_string) {
        return Ok(LegacyScenario::Nutrition);
    }
    Err(InvalidPayload)
}

/// `{imageBase64, ingredientsHint?, servings?}`
pub fn parse_image_request(payload: &Value) -> Result<CoachRequest, ValidationError> {
    let encoded = payload
        .get("imageBase64")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::new("imageBase64 is required"))?;

    let (mime_type, data) = split_data_url(encoded)?;
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let image = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ValidationError::new("imageBase64 is not valid base64"))?;
    if image.is_empty() {
        return Err(ValidationError::new("imageBase64 is required"));
    }

    let servings = parse_servings(payload.get("servings"))?;

    let ingredients_hint = payload
        .get("ingredientsHint")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Ok(CoachRequest::ImageEstimate {
        image,
        mime_type,
        ingredients_hint,
        servings,
    })
}

/// 缺省或 null 为 1；只接受数字和数字字符串，且必须是有限正数
fn parse_servings(value: Option<&Value>) -> Result<f64, ValidationError> {
    let servings = match value {
        None | Some(Value::Null) => return Ok(1.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    servings
        .filter(|s| s.is_finite() && *s > 0.0)
        .ok_or_else(|| ValidationError::new("servings must be a positive number"))
}

/// 解析裸 base64 或 `data:<mime>;base64,<data>`
fn split_data_url(encoded: &str) -> Result<(String, &str), ValidationError> {
    let Some(rest) = encoded.strip_prefix("data:") else {
        return Ok((DEFAULT_MIME_TYPE.to_string(), encoded));
    };

    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| ValidationError::new("imageBase64 data URL is malformed"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| ValidationError::new("imageBase64 data URL must be base64 encoded"))?;

    if !mime_type.starts_with("image/") {
        return Err(ValidationError::new("imageBase64 must contain an image"));
    }
    Ok((mime_type.to_string(), data))
}

/// `{messages: [{role, content}], availableExercises?}`
pub fn parse_workout_request(payload: &Value) -> Result<CoachRequest, ValidationError> {
    let messages = payload
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::new("messages must be an array of { role, content }"))?;

    let history = messages.iter().filter_map(parse_turn).collect();

    let mut available_exercises: Vec<String> = Vec::new();
    if let Some(names) = payload.get("availableExercises").and_then(Value::as_array) {
        for name in names.iter().filter_map(Value::as_str).map(str::trim) {
            if !name.is_empty() && !available_exercises.iter().any(|n| n == name) {
                available_exercises.push(name.to_string());
            }
        }
    }

    Ok(CoachRequest::Workout {
        history,
        available_exercises,
    })
}

fn parse_turn(value: &Value) -> Option<ChatTurn> {
    let role = match value.get("role").and_then(Value::as_str) {
        Some("user") => TurnRole::User,
        Some("assistant") => TurnRole::Assistant,
        other => {
            tracing::debug!(role = ?other, "skipping chat turn with unsupported role");
            return None;
        }
    };

    let content = value
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(ChatTurn { role, content })
}

/// `{message: string}`，去空白后不能为空
pub fn parse_nutrition_request(payload: &Value) -> Result<CoachRequest, ValidationError> {
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::new("message is required"))?;

    Ok(CoachRequest::Nutrition {
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn messages_array_wins_over_message_string() {
        let payload = json!({
            "messages": [{"role": "user", "content": "hi"}],
            "message": "what should I eat?"
        });
        assert_eq!(classify(&payload), Ok(LegacyScenario::Workout));
    }

    #[test]
    fn message_string_is_nutrition() {
        assert_eq!(
            classify(&json!({"message": "protein?"})),
            Ok(LegacyScenario::Nutrition)
        );
        assert_eq!(classify(&json!({"message": ""})), Ok(LegacyScenario::Nutrition));
    }

    #[test]
    fn other_shapes_are_invalid() {
        for payload in [
            json!({}),
            json!({"messages": "hi"}),
            json!({"message": 42}),
            json!([1, 2]),
            json!("text"),
        ] {
            assert_eq!(classify(&payload), Err(InvalidPayload));
        }
        let msg = InvalidPayload.to_string();
        assert!(msg.contains("messages") && msg.contains("message: string"));
    }

    #[test]
    fn image_request_accepts_data_url() {
        let payload = json!({
            "imageBase64": "data:image/png;base64,iVBO\nRw==",
            "ingredientsHint": " salmon ",
            "servings": 2
        });
        let request = parse_image_request(&payload).unwrap();
        assert_eq!(
            request,
            CoachRequest::ImageEstimate {
                image: vec![0x89, 0x50, 0x4e, 0x47],
                mime_type: "image/png".to_string(),
                ingredients_hint: "salmon".to_string(),
                servings: 2.0,
            }
        );
    }

    #[test]
    fn image_request_defaults_to_one_jpeg_serving() {
        let request = parse_image_request(&json!({"imageBase64": "/9j/"})).unwrap();
        match request {
            CoachRequest::ImageEstimate {
                mime_type,
                servings,
                ingredients_hint,
                ..
            } => {
                assert_eq!(mime_type, "image/jpeg");
                assert_eq!(servings, 1.0);
                assert_eq!(ingredients_hint, "");
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn image_request_rejects_bad_input() {
        let cases = [
            (json!({}), "imageBase64 is required"),
            (json!({"imageBase64": "  "}), "imageBase64 is required"),
            (json!({"imageBase64": "%%%"}), "imageBase64 is not valid base64"),
            (
                json!({"imageBase64": "data:text/plain;base64,aGk="}),
                "imageBase64 must contain an image",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": 0}),
                "servings must be a positive number",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": "two"}),
                "servings must be a positive number",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": -1.5}),
                "servings must be a positive number",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": true}),
                "servings must be a positive number",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": [2]}),
                "servings must be a positive number",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": {"count": 2}}),
                "servings must be a positive number",
            ),
            (
                json!({"imageBase64": "/9j/", "servings": ""}),
                "servings must be a positive number",
            ),
        ];

        for (payload, expected) in cases {
            assert_eq!(
                parse_image_request(&payload),
                Err(ValidationError(expected.to_string())),
                "payload: {payload}"
            );
        }
    }

    #[test]
    fn image_request_accepts_numeric_string_servings() {
        let request =
            parse_image_request(&json!({"imageBase64": "/9j/", "servings": " 1.5 "})).unwrap();
        assert!(matches!(
            request,
            CoachRequest::ImageEstimate { servings, .. } if servings == 1.5
        ));
    }

    #[test]
    fn workout_request_keeps_order_and_defaults_content() {
        let payload = json!({
            "messages": [
                {"role": "user", "content": "Upper body please"},
                {"role": "assistant"},
                {"role": "system", "content": "ignored"},
                {"role": "user", "content": "No barbell"}
            ],
            "availableExercises": ["Dumbbell press", " Pull-up ", "Dumbbell press", "", 7]
        });

        let request = parse_workout_request(&payload).unwrap();
        assert_eq!(
            request,
            CoachRequest::Workout {
                history: vec![
                    ChatTurn {
                        role: TurnRole::User,
                        content: "Upper body please".to_string()
                    },
                    ChatTurn {
                        role: TurnRole::Assistant,
                        content: String::new()
                    },
                    ChatTurn {
                        role: TurnRole::User,
                        content: "No barbell".to_string()
                    },
                ],
                available_exercises: vec!["Dumbbell press".to_string(), "Pull-up".to_string()],
            }
        );
    }

    #[test]
    fn workout_request_requires_messages_array() {
        assert!(parse_workout_request(&json!({"message": "hi"})).is_err());
        assert!(parse_workout_request(&json!({"messages": []})).is_ok());
    }

    #[test]
    fn nutrition_request_requires_non_blank_message() {
        assert_eq!(
            parse_nutrition_request(&json!({"message": "   "})),
            Err(ValidationError("message is required".to_string()))
        );
        assert_eq!(
            parse_nutrition_request(&json!({"message": " Is rice ok? "})),
            Ok(CoachRequest::Nutrition {
                message: "Is rice ok?".to_string()
            })
        );
    }
}
