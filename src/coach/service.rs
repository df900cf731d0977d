//! 场景流水线：构建提示词 → 调用上游 → 规范化输出

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use super::normalize::{self, NormalizeError};
use super::prompts::build_prompt;
use super::{CoachReply, CoachRequest, Scenario};
use crate::providers::{CompletionClient, CompletionRequest, UpstreamError};

/// 已解析的模型名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Models {
    pub text: String,
    pub vision: String,
}

impl Models {
    pub fn for_scenario(&self, scenario: Scenario) -> &str {
        if scenario.uses_vision_model() {
            &self.vision
        } else {
            &self.text
        }
    }
}

#[derive(Debug, Error)]
pub enum CoachError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// 共享的教练服务，所有路由（包括旧版入口）都经过这里
pub struct CoachService {
    client: Arc<dyn CompletionClient>,
    models: Models,
}

impl CoachService {
    pub fn new(client: Arc<dyn CompletionClient>, models: Models) -> Self {
        Self { client, models }
    }

    pub fn client(&self) -> &dyn CompletionClient {
        self.client.as_ref()
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    /// 执行一次场景请求，只调用一次上游，不重试
    pub async fn run(&self, request: &CoachRequest) -> Result<CoachReply, CoachError> {
        let scenario = request.scenario();
        let model = self.models.for_scenario(scenario).to_string();
        let generation = scenario.generation();
        let messages = build_prompt(request).into_messages();

        tracing::info!(
            %scenario,
            model,
            provider = self.client.name(),
            messages = messages.len(),
            "request"
        );

        let start = Instant::now();
        let raw = self
            .client
            .complete(CompletionRequest {
                model: model.clone(),
                messages,
                max_tokens: generation.max_tokens,
                temperature: generation.temperature,
                json_mode: true,
            })
            .await
            .inspect_err(|e| {
                tracing::error!(
                    %scenario,
                    model,
                    status = e.status(),
                    code = e.code(),
                    kind = e.kind(),
                    "upstream call failed: {e}"
                );
            })?;

        tracing::info!(
            %scenario,
            model,
            output_chars = raw.chars().count(),
            latency_ms = start.elapsed().as_millis() as u64,
            "response"
        );

        normalize::normalize(&raw, scenario)
            .inspect_err(|e| tracing::error!(%scenario, model, "invalid model output: {e}"))
            .map_err(CoachError::from)
    }
}
