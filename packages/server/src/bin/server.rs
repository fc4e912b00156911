//! HTTP façade
//!
//! Stateless job API in front of the execution engine. Jobs run in the
//! Restate workflow endpoint (`workflow_server`) or, for local development,
//! in-process with `ENGINE_BACKEND=memory`.

use std::sync::Arc;

use anyhow::{Context, Result};
use job_service::kernel::{
    BaseExecutionEngine, ExecutionGateway, InMemoryEngine, RestateEngine, ENGINE_CALL_TIMEOUT,
};
use job_service::server::{build_app, serve_with_drain, shutdown_signal};
use job_service::{Config, EngineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_service=debug,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting job service");

    let config = Config::from_env().context("Failed to load configuration")?;

    let engine: Arc<dyn BaseExecutionEngine> = match &config.engine {
        EngineConfig::Restate { url, service } => {
            let engine =
                RestateEngine::new(url, service.clone()).context("Invalid ENGINE_URL")?;

            tracing::info!(url = %url, service = %service, "Connecting to Restate");
            tokio::time::timeout(ENGINE_CALL_TIMEOUT, engine.describe())
                .await
                .context("Timed out probing the Restate ingress")?
                .context("Restate ingress is not reachable")?;

            Arc::new(engine)
        }
        EngineConfig::Memory { workers } => {
            tracing::warn!(workers, "Using the in-memory engine; jobs will not survive a restart");
            Arc::new(InMemoryEngine::new(*workers))
        }
    };

    let app = build_app(ExecutionGateway::new(engine));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind HTTP server")?;
    tracing::info!("Server listening on {}", addr);

    serve_with_drain(listener, app, shutdown_signal(), config.shutdown_grace)
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
