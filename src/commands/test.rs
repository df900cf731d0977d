//! Test 命令 - 发送测试请求到本地服务器
//!
//! 向本地运行的中继服务器发送一条营养教练请求，验证服务和上游是否正常工作。

use anyhow::{Context, Result};

use crate::config::Config;

pub const DEFAULT_TEST_MESSAGE: &str = "What is a good high-protein breakfast?";

/// 执行测试命令
///
/// # 参数
///
/// * `config` - 应用配置，用于获取服务器地址
/// * `message` - 发给营养教练的消息
pub async fn test_command(config: Config, message: String) -> Result<()> {
    println!("Sending test request to local server...");

    let test_body = serde_json::json!({ "message": message });

    // 监听 0.0.0.0 时本机用回环地址访问
    let host = if config.host == "0.0.0.0" {
        "127.0.0.1"
    } else {
        config.host.as_str()
    };
    let url = format!("http://{}:{}/nutrition-coach", host, config.port);

    println!("Request URL: {}", url);

    let response = reqwest::Client::new()
        .post(&url)
        .json(&test_body)
        .send()
        .await
        .context("Request failed. Make sure the server is running.")?;

    let status = response.status();
    println!("Response status: {}", status);

    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    if !status.is_success() {
        anyhow::bail!("Request failed: {}", body);
    }

    println!("Response:");
    println!("{}", body);

    Ok(())
}
