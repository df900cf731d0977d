//! Serve 命令 - 启动中继服务器

use anyhow::Result;

use crate::config::Config;
use crate::gateway;

/// 执行服务器启动命令
///
/// 构建上游客户端和路由，监听配置的地址，收到 Ctrl+C 或 SIGTERM 后优雅关闭
pub async fn serve_command(config: Config) -> Result<()> {
    gateway::serve(config).await
}
