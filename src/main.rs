//! Coach Relay - 健身教练 App 的 LLM 中继服务
//!
//! 把移动端的餐食图片、训练对话和营养问题转发给 LLM 补全接口，
//! 注入各场景的系统指令，并把模型输出整理成稳定的响应结构。
//!
//! # 路由
//!
//! - `POST /nutrition-image`: 餐食图片宏量营养素估算
//! - `POST /workout-coach`: 训练计划对话
//! - `POST /nutrition-coach`: 营养问答
//! - `POST /fitness-coach`: 旧版入口，按请求体形状转到训练或营养
//! - `GET /health`: 存活检查
//!
//! # 命令行接口
//!
//! - `serve`: 启动中继服务器
//! - `test`: 向本地服务器发送测试请求

mod coach;
mod commands;
mod config;
mod gateway;
mod providers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Coach Relay CLI
#[derive(Parser)]
#[command(name = "coach-relay")]
#[command(about = "LLM relay for a fitness coaching app", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 可用的命令
#[derive(Subcommand)]
enum Commands {
    /// 启动中继服务器
    Serve,
    /// 向本地服务器发送测试请求
    Test {
        /// 发给营养教练的消息
        #[arg(short, long, default_value = commands::test::DEFAULT_TEST_MESSAGE)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    if let Ok(dotenv_path) = std::env::var("COACH_ENV_FILE") {
        dotenvy::from_path(&dotenv_path).ok();
    } else {
        dotenvy::dotenv().ok();
    }

    // 初始化日志系统
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coach_relay=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => commands::serve_command(config).await,
        Commands::Test { message } => commands::test_command(config, message).await,
    }
}
