//! Gateway 应用层
//!
//! HTTP 服务器和请求处理

mod handlers;
mod middleware;
mod state;

pub use state::AppState;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::coach::service::{CoachService, Models};
use crate::config::Config;
use crate::providers::OpenAiClient;

pub async fn serve(config: Config) -> Result<()> {
    let client = OpenAiClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.upstream_timeout,
    )?;
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; coaching requests will fail until it is");
    }

    let models = Models {
        text: config.model.clone(),
        vision: config.vision_model.clone(),
    };
    tracing::info!(model = %models.text, vision_model = %models.vision, "models resolved");

    let state = AppState::new(CoachService::new(Arc::new(client), models));
    let app = build_router(state, &config);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/nutrition-image", post(handlers::handle_nutrition_image))
        .route("/workout-coach", post(handlers::handle_workout_coach))
        .route("/nutrition-coach", post(handlers::handle_nutrition_coach))
        .route("/fitness-coach", post(handlers::handle_fitness_coach))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_logger))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    tokio::select! {
        _ = ctrl_c => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
