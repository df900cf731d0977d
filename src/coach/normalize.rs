//! 模型输出规范化
//!
//! 上游模型被要求只输出 JSON，但无法保证。这里把原始文本解析为各场景的
//! 结果类型：对话类场景解析失败时降级为纯文本回复，图片场景遇到无效数值
//! 直接失败。

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;
use thiserror::Error;

use super::{
    CoachReply, Exercise, MacroTotals, MealEstimate, NutritionReply, Reps, Scenario, WorkoutPlan,
    WorkoutReply,
};

pub const DEFAULT_MEAL_NAME: &str = "Meal estimate";
pub const NOTE_MAX_CHARS: usize = 160;
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't put together a reply this time. Please try asking again.";
pub const WARM_UP_NAME: &str = "Treadmill walk";
const WARM_UP_REPS: &str = "5 min";

/// 2^53，超出后 f64 无法精确表示整数
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

const MACRO_FIELDS: [&str; 4] = ["calories", "protein", "carbs", "fats"];

/// 图片场景的硬失败，携带原始文本便于排查
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("model output is not a JSON object")]
    NotAnObject { raw: String },

    #[error("model output has a non-finite `{field}` value")]
    NonFinite { field: &'static str, raw: String },

    #[error("model output has an out-of-range `{field}` value")]
    OutOfRange { field: &'static str, raw: String },
}

impl NormalizeError {
    pub fn raw(&self) -> &str {
        match self {
            NormalizeError::NotAnObject { raw }
            | NormalizeError::NonFinite { raw, .. }
            | NormalizeError::OutOfRange { raw, .. } => raw.as_str(),
        }
    }
}

/// 按场景规范化模型输出
pub fn normalize(raw: &str, scenario: Scenario) -> Result<CoachReply, NormalizeError> {
    match scenario {
        Scenario::ImageEstimate => normalize_meal(raw).map(CoachReply::Meal),
        Scenario::Workout => Ok(CoachReply::Workout(normalize_workout(raw))),
        Scenario::Nutrition => Ok(CoachReply::Nutrition(normalize_nutrition(raw))),
    }
}

pub fn normalize_meal(raw: &str) -> Result<MealEstimate, NormalizeError> {
    let obj = parse_object(raw).ok_or_else(|| NormalizeError::NotAnObject {
        raw: raw.to_string(),
    })?;

    let mut totals = [0i64; 4];
    for (slot, field) in totals.iter_mut().zip(MACRO_FIELDS) {
        let value = coerce_number(obj.get(field));
        if !value.is_finite() {
            return Err(NormalizeError::NonFinite {
                field,
                raw: raw.to_string(),
            });
        }
        *slot = round_half_even(value).ok_or_else(|| NormalizeError::OutOfRange {
            field,
            raw: raw.to_string(),
        })?;
    }
    let [calories, protein, carbs, fats] = totals;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_MEAL_NAME)
        .to_string();

    let note = obj
        .get("note")
        .and_then(Value::as_str)
        .map(|s| truncate_chars(s.trim(), NOTE_MAX_CHARS))
        .unwrap_or_default();

    Ok(MealEstimate {
        name,
        calories,
        protein,
        carbs,
        fats,
        note,
    })
}

pub fn normalize_workout(raw: &str) -> WorkoutReply {
    match parse_object(raw) {
        Some(obj) => WorkoutReply {
            reply: reply_or_raw(&obj, raw),
            plan: obj.get("plan").and_then(parse_plan),
        },
        None => {
            tracing::warn!(scenario = "workout", len = raw.len(), "model output is not JSON");
            WorkoutReply {
                reply: fallback_reply(raw),
                plan: None,
            }
        }
    }
}

pub fn normalize_nutrition(raw: &str) -> NutritionReply {
    match parse_object(raw) {
        Some(obj) => NutritionReply {
            reply: reply_or_raw(&obj, raw),
            macros: obj.get("macros").and_then(parse_macros),
        },
        None => {
            tracing::warn!(scenario = "nutrition", len = raw.len(), "model output is not JSON");
            NutritionReply {
                reply: fallback_reply(raw),
                macros: None,
            }
        }
    }
}

/// 去掉首尾空白和包裹整段输出的 Markdown 代码块
fn strip_code_fence(raw: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n?(.*?)\s*```$").expect("valid fence regex")
    });

    let trimmed = raw.trim();
    fence
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(raw)) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// 宽松的数值转换：数字原样，字符串去空白后解析（空串为 0），
/// 布尔为 0/1，null 为 0，缺失、数组、对象为 NaN
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// 四舍六入五成双；超出安全整数范围返回 None
fn round_half_even(value: f64) -> Option<i64> {
    let rounded = value.round_ties_even();
    (rounded.abs() < MAX_SAFE_INTEGER).then_some(rounded as i64)
}

/// 有限数值转为 JSON 数字，整数值保持整数形式
fn to_json_number(value: f64) -> Option<Number> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}

fn finite_number(value: Option<&Value>) -> Option<Number> {
    match value? {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(to_json_number),
        _ => None,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn reply_or_raw(obj: &Map<String, Value>, raw: &str) -> String {
    obj.get("reply")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| raw.trim())
        .to_string()
}

fn fallback_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_macros(value: &Value) -> Option<MacroTotals> {
    let obj = value.as_object()?;
    Some(MacroTotals {
        calories: finite_number(obj.get("calories"))?,
        protein: finite_number(obj.get("protein"))?,
        carbs: finite_number(obj.get("carbs"))?,
        fats: finite_number(obj.get("fats"))?,
    })
}

fn parse_plan(value: &Value) -> Option<WorkoutPlan> {
    let obj = value.as_object()?;

    let mut exercises: Vec<Exercise> = obj
        .get("exercises")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_exercise).collect())
        .unwrap_or_default();
    ensure_warm_up(&mut exercises);

    Some(WorkoutPlan {
        rest_seconds: finite_number(obj.get("restSeconds")),
        exercises,
    })
}

fn parse_exercise(value: &Value) -> Option<Exercise> {
    let obj = value.as_object()?;
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let sets = coerce_number(obj.get("sets"));
    let sets = if sets >= 1.0 {
        round_half_even(sets).unwrap_or(1)
    } else {
        1
    };

    let reps = match obj.get("reps") {
        Some(Value::Number(n)) => Some(match n.as_i64() {
            Some(count) => Reps::Count(count),
            None => Reps::Text(n.to_string()),
        }),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(Reps::Text(s.trim().to_string())),
        _ => None,
    };

    Some(Exercise {
        name: name.to_string(),
        sets,
        reps,
        rest_seconds: finite_number(obj.get("restSeconds")),
    })
}

fn is_warm_up(exercise: &Exercise) -> bool {
    exercise.name.eq_ignore_ascii_case(WARM_UP_NAME)
}

/// 计划的第一项必须是 1 组的热身跑步机步行；其余项保持模型给出的顺序
fn ensure_warm_up(exercises: &mut Vec<Exercise>) {
    match exercises.first_mut() {
        Some(first) if is_warm_up(first) => {
            first.name = WARM_UP_NAME.to_string();
            first.sets = 1;
        }
        _ => exercises.insert(
            0,
            Exercise {
                name: WARM_UP_NAME.to_string(),
                sets: 1,
                reps: Some(Reps::Text(WARM_UP_REPS.to_string())),
                rest_seconds: None,
            },
        ),
    }
}
