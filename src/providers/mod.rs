//! 上游补全接口抽象层
//!
//! 定义所有 LLM 补全服务的统一接口，以及发往上游的消息结构

pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use openai::OpenAiClient;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 图片引用（URL 或 data URL）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// 多模态消息中的单个片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// 消息内容：纯文本或文本+图片
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }
}

/// 一次补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// 要求上游只输出 JSON 对象
    pub json_mode: bool,
}

/// 上游调用失败的原因
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream API key is not configured")]
    MissingCredentials,

    #[error("failed to reach upstream: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {message}")]
    Api {
        status: http::StatusCode,
        code: Option<String>,
        kind: Option<String>,
        message: String,
    },

    #[error("upstream returned no completion choices")]
    EmptyCompletion,
}

impl UpstreamError {
    /// HTTP 状态码（仅 API 错误有）
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Api { status, .. } => Some(status.as_u16()),
            UpstreamError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            UpstreamError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            UpstreamError::Api { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}

/// CompletionClient Trait - 上游补全服务的统一接口
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 客户端名称（用于日志和健康检查）
    fn name(&self) -> &str;

    /// 是否已配置访问凭证
    fn has_credentials(&self) -> bool;

    /// 执行一次补全，返回模型输出的文本
    async fn complete(&self, request: CompletionRequest) -> Result<String, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multimodal_message_serializes_as_openai_parts() {
        let message = Message::parts(
            Role::User,
            vec![
                ContentPart::Text {
                    text: "Servings: 2".to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AAAA".to_string(),
                    },
                },
            ],
        );

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "Servings: 2"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            })
        );
    }

    #[test]
    fn text_message_serializes_as_plain_string() {
        let message = Message::text(Role::System, "be brief");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "system", "content": "be brief"})
        );
    }
}
