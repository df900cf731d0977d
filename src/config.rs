//! 应用配置模块
//!
//! 负责从环境变量加载应用配置，包括：
//! - 服务器监听地址和端口
//! - 上游 API 密钥、地址和模型名称
//! - 请求体大小和上游超时

use anyhow::{Context, Result};
use std::time::Duration;

use crate::providers::openai::DEFAULT_BASE_URL;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// 应用配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器监听地址（如 "0.0.0.0" 或 "127.0.0.1"）
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 上游 API 密钥，缺失时服务仍可启动，但所有上游调用都会失败
    pub api_key: Option<String>,
    /// OpenAI 兼容接口的基础地址
    pub base_url: String,
    /// 文本场景使用的模型
    pub model: String,
    /// 图片场景使用的模型
    pub vision_model: String,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
    /// 上游请求超时
    pub upstream_timeout: Duration,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// # 环境变量
    ///
    /// - `COACH_HOST`: 服务器监听地址（默认: "0.0.0.0"）
    /// - `COACH_PORT` 或 `PORT`: 服务器监听端口（默认: 3000）
    /// - `OPENAI_API_KEY`: 上游 API 密钥
    /// - `OPENAI_BASE_URL`: 上游地址（默认: OpenAI 官方地址）
    /// - `COACH_MODEL`: 默认模型（默认: "gpt-4o-mini"）
    /// - `COACH_VISION_MODEL`: 视觉模型（默认与 `COACH_MODEL` 相同）
    /// - `COACH_BODY_LIMIT_MB`: 请求体上限，单位 MB（默认: 10）
    /// - `COACH_UPSTREAM_TIMEOUT_SECS`: 上游超时秒数（默认: 60）
    ///
    /// # 错误
    ///
    /// 数值类变量无法解析时返回错误
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("COACH_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = var("COACH_PORT")
            .or_else(|| var("PORT"))
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("COACH_PORT must be a valid port number")?;

        let model = var("COACH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let vision_model = var("COACH_VISION_MODEL").unwrap_or_else(|| model.clone());

        let body_limit_mb: usize = var("COACH_BODY_LIMIT_MB")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("COACH_BODY_LIMIT_MB must be a whole number of megabytes")?;

        let timeout_secs: u64 = var("COACH_UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("COACH_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            host,
            port,
            api_key: var("OPENAI_API_KEY"),
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            vision_model,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
