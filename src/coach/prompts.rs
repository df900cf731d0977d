//! 提示词构建
//!
//! 纯函数：相同输入总是得到相同的系统指令和用户内容，不做任何 I/O

use base64::{engine::general_purpose::STANDARD, Engine};

use super::normalize::{NOTE_MAX_CHARS, WARM_UP_NAME};
use super::{ChatTurn, CoachRequest, TurnRole};
use crate::providers::{ContentPart, ImageUrl, Message, Role};

const NO_EXERCISES_PHRASE: &str =
    "No equipment list was provided; choose common gym or bodyweight exercises.";

const NUTRITION_PERSONA: &str = "You are a friendly, evidence-based nutrition coach inside a \
fitness app. Give practical, concise advice (under 150 words) about food, macros, hydration \
and eating habits. Do not diagnose medical conditions; suggest seeing a professional when \
the question is medical.";

const NUTRITION_OUTPUT_RULES: &str = "Respond with ONLY a JSON object, no markdown, of the \
form {\"reply\": string, \"macros\": {\"calories\": number, \"protein\": number, \"carbs\": \
number, \"fats\": number} | null}.\n\
- If the user asks for daily targets, a meal plan or macro numbers, put your explanation in \
\"reply\" and the daily totals (kcal and grams) in \"macros\".\n\
- For general advice or any other question, answer in \"reply\" and set \"macros\" to null.";

/// 发往上游的用户侧内容
#[derive(Debug, Clone, PartialEq)]
pub enum UserContent {
    Text(String),
    TextWithImage { text: String, image_url: String },
    History(Vec<ChatTurn>),
}

/// 一次构建的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_content: UserContent,
}

impl Prompt {
    /// 转换为上游消息列表，系统指令在最前
    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = vec![Message::text(Role::System, self.system_instruction)];

        match self.user_content {
            UserContent::Text(text) => messages.push(Message::text(Role::User, text)),
            UserContent::TextWithImage { text, image_url } => messages.push(Message::parts(
                Role::User,
                vec![
                    ContentPart::Text { text },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ],
            )),
            UserContent::History(turns) => messages.extend(turns.into_iter().map(|turn| {
                let role = match turn.role {
                    TurnRole::User => Role::User,
                    TurnRole::Assistant => Role::Assistant,
                };
                Message::text(role, turn.content)
            })),
        }

        messages
    }
}

pub fn build_prompt(request: &CoachRequest) -> Prompt {
    match request {
        CoachRequest::ImageEstimate {
            image,
            mime_type,
            ingredients_hint,
            servings,
        } => image_prompt(image, mime_type, ingredients_hint, *servings),
        CoachRequest::Workout {
            history,
            available_exercises,
        } => workout_prompt(history, available_exercises),
        CoachRequest::Nutrition { message } => nutrition_prompt(message),
    }
}

fn image_prompt(image: &[u8], mime_type: &str, ingredients_hint: &str, servings: f64) -> Prompt {
    let system_instruction = format!(
        "You are a nutrition estimator. Look at the meal photo and estimate its nutrition.\n\
         Respond with ONLY a JSON object, no markdown, matching exactly:\n\
         {{\"name\": string, \"calories\": integer, \"protein\": integer, \"carbs\": integer, \
         \"fats\": integer, \"note\": string}}\n\
         - calories in kcal; protein, carbs and fats in grams.\n\
         - All values are integer TOTALS for {servings} serving(s), not per serving.\n\
         - \"note\" is at most {NOTE_MAX_CHARS} characters: mention assumptions such as portion \
         size or hidden oils."
    );

    let hint = ingredients_hint.trim();
    let hint = if hint.is_empty() { "none" } else { hint };
    let text = format!("Servings: {servings}\nIngredients hint: {hint}");

    Prompt {
        system_instruction,
        user_content: UserContent::TextWithImage {
            text,
            image_url: format!("data:{};base64,{}", mime_type, STANDARD.encode(image)),
        },
    }
}

fn workout_prompt(history: &[ChatTurn], available_exercises: &[String]) -> Prompt {
    let exercises = if available_exercises.is_empty() {
        NO_EXERCISES_PHRASE.to_string()
    } else {
        format!(
            "Only use exercises from this list: {}.",
            available_exercises.join(", ")
        )
    };

    let system_instruction = format!(
        "You are an encouraging strength and conditioning coach in a fitness app. Build or \
         adjust today's workout from the conversation.\n\
         {exercises}\n\
         The first exercise must always be the warm-up \"{WARM_UP_NAME}\" with 1 set.\n\
         Describe the exercises in \"reply\" in exactly the same order as in \"plan.exercises\".\n\
         Respond with ONLY a JSON object, no markdown, of the form:\n\
         {{\"reply\": string, \"plan\": {{\"restSeconds\": number | null, \"exercises\": \
         [{{\"name\": string, \"sets\": number, \"reps\": number | string, \"restSeconds\": \
         number | null}}]}} | null}}\n\
         Set \"plan\" to null when the user is only chatting and no workout is needed."
    );

    Prompt {
        system_instruction,
        user_content: UserContent::History(history.to_vec()),
    }
}

fn nutrition_prompt(message: &str) -> Prompt {
    Prompt {
        system_instruction: format!("{NUTRITION_PERSONA}\n\n{NUTRITION_OUTPUT_RULES}"),
        user_content: UserContent::Text(message.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MessageContent;
    use pretty_assertions::assert_eq;

    fn image_request(hint: &str, servings: f64) -> CoachRequest {
        CoachRequest::ImageEstimate {
            image: vec![0xff, 0xd8, 0xff],
            mime_type: "image/jpeg".to_string(),
            ingredients_hint: hint.to_string(),
            servings,
        }
    }

    #[test]
    fn building_twice_gives_identical_prompts() {
        let requests = [
            image_request("rice, chicken", 2.0),
            CoachRequest::Workout {
                history: vec![ChatTurn {
                    role: TurnRole::User,
                    content: "Legs today".to_string(),
                }],
                available_exercises: vec!["Leg press".to_string()],
            },
            CoachRequest::Nutrition {
                message: "How much protein?".to_string(),
            },
        ];

        for request in &requests {
            assert_eq!(build_prompt(request), build_prompt(request));
        }
    }

    #[test]
    fn image_prompt_carries_servings_hint_and_data_url() {
        let prompt = build_prompt(&image_request("  ", 2.0));

        assert!(prompt.system_instruction.contains("TOTALS for 2 serving(s)"));
        assert!(prompt.system_instruction.contains("at most 160 characters"));
        assert_eq!(
            prompt.user_content,
            UserContent::TextWithImage {
                text: "Servings: 2\nIngredients hint: none".to_string(),
                image_url: "data:image/jpeg;base64,/9j/".to_string(),
            }
        );
    }

    #[test]
    fn workout_prompt_lists_exercises_and_warm_up() {
        let prompt = build_prompt(&CoachRequest::Workout {
            history: vec![],
            available_exercises: vec!["Bench press".to_string(), "Lat pulldown".to_string()],
        });

        assert!(prompt
            .system_instruction
            .contains("Only use exercises from this list: Bench press, Lat pulldown."));
        assert!(prompt.system_instruction.contains("\"Treadmill walk\" with 1 set"));
    }

    #[test]
    fn workout_prompt_without_exercises_uses_generic_phrase() {
        let prompt = build_prompt(&CoachRequest::Workout {
            history: vec![],
            available_exercises: vec![],
        });
        assert!(prompt.system_instruction.contains(NO_EXERCISES_PHRASE));
    }

    #[test]
    fn history_is_passed_through_in_order() {
        let history = vec![
            ChatTurn {
                role: TurnRole::User,
                content: "Plan a push day".to_string(),
            },
            ChatTurn {
                role: TurnRole::Assistant,
                content: "Sure, how long?".to_string(),
            },
            ChatTurn {
                role: TurnRole::User,
                content: "45 minutes".to_string(),
            },
        ];
        let messages = build_prompt(&CoachRequest::Workout {
            history,
            available_exercises: vec![],
        })
        .into_messages();

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(
            messages[3].content,
            MessageContent::Text("45 minutes".to_string())
        );
    }

    #[test]
    fn nutrition_prompt_trims_message() {
        let prompt = build_prompt(&CoachRequest::Nutrition {
            message: "  What about creatine?  ".to_string(),
        });
        assert_eq!(
            prompt.user_content,
            UserContent::Text("What about creatine?".to_string())
        );
        assert!(prompt.system_instruction.contains("\"macros\" to null"));
    }

    #[test]
    fn image_prompt_becomes_multimodal_user_message() {
        let messages = build_prompt(&image_request("oats", 1.5)).into_messages();
        assert_eq!(messages.len(), 2);
        match &messages[1].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(
                    parts[0],
                    ContentPart::Text {
                        text: "Servings: 1.5\nIngredients hint: oats".to_string()
                    }
                );
            }
            other => panic!("expected multimodal content, got {other:?}"),
        }
    }
}
