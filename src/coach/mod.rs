//! 教练场景核心逻辑
//!
//! 三个场景（餐食图片估算、训练计划、营养对话）共用的数据模型，
//! 以及请求分发、提示词构建、模型输出规范化和场景流水线

pub mod dispatch;
pub mod normalize;
pub mod prompts;
pub mod service;

use serde::Serialize;

/// 教练场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    ImageEstimate,
    Workout,
    Nutrition,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::ImageEstimate => "image_estimate",
            Scenario::Workout => "workout",
            Scenario::Nutrition => "nutrition",
        }
    }

    /// 每个场景固定的生成参数
    pub fn generation(&self) -> Generation {
        match self {
            Scenario::ImageEstimate => Generation {
                max_tokens: 400,
                temperature: 0.2,
            },
            Scenario::Workout => Generation {
                max_tokens: 900,
                temperature: 0.7,
            },
            Scenario::Nutrition => Generation {
                max_tokens: 700,
                temperature: 0.5,
            },
        }
    }

    /// 图片场景走视觉模型，其余走默认模型
    pub fn uses_vision_model(&self) -> bool {
        matches!(self, Scenario::ImageEstimate)
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Generation {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// 对话中的一轮
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

/// 已通过校验的场景请求
#[derive(Debug, Clone, PartialEq)]
pub enum CoachRequest {
    ImageEstimate {
        image: Vec<u8>,
        mime_type: String,
        ingredients_hint: String,
        servings: f64,
    },
    Workout {
        history: Vec<ChatTurn>,
        available_exercises: Vec<String>,
    },
    Nutrition {
        message: String,
    },
}

impl CoachRequest {
    pub fn scenario(&self) -> Scenario {
        match self {
            CoachRequest::ImageEstimate { .. } => Scenario::ImageEstimate,
            CoachRequest::Workout { .. } => Scenario::Workout,
            CoachRequest::Nutrition { .. } => Scenario::Nutrition,
        }
    }
}

/// 图片场景结果，宏量营养素为指定份数的总量
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealEstimate {
    pub name: String,
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
    pub note: String,
}

/// 次数可以是数字，也可以是 "8-12"、"30 sec" 这样的文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reps {
    Count(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub sets: i64,
    pub reps: Option<Reps>,
    pub rest_seconds: Option<serde_json::Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub rest_seconds: Option<serde_json::Number>,
    pub exercises: Vec<Exercise>,
}

/// 训练场景结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutReply {
    pub reply: String,
    pub plan: Option<WorkoutPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: serde_json::Number,
    pub protein: serde_json::Number,
    pub carbs: serde_json::Number,
    pub fats: serde_json::Number,
}

/// 营养对话场景结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionReply {
    pub reply: String,
    pub macros: Option<MacroTotals>,
}

/// 任一场景的规范化结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoachReply {
    Meal(MealEstimate),
    Workout(WorkoutReply),
    Nutrition(NutritionReply),
}
