//! Restate Workflow Server
//!
//! This binary runs the Restate workflow HTTP server that executes job
//! workflows durably. Register it with the Restate cluster the façade's
//! `ENGINE_URL` points at.

use anyhow::{Context, Result};
use job_service::domains::jobs::restate::{JobWorkflow, JobWorkflowImpl};
use job_service::WorkflowServerConfig;
use restate_sdk::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_service=debug,restate_sdk=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = WorkflowServerConfig::from_env().context("Failed to load configuration")?;

    let mut builder = Endpoint::builder();

    // Configure Restate request identity verification
    if let Some(identity_key) = &config.restate_identity_key {
        tracing::info!("Restate identity key configured");
        builder = builder
            .identity_key(identity_key)
            .context("Invalid Restate identity key")?;
    }

    let endpoint = builder.bind(JobWorkflowImpl::default().serve()).build();

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Workflow server listening on {}", addr);

    HttpServer::new(endpoint)
        .listen_and_serve(addr.parse()?)
        .await;

    Ok(())
}
