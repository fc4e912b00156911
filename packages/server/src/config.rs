use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::server::SHUTDOWN_GRACE;

/// Which execution engine backs the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineConfig {
    /// Restate ingress at `url`, workflows registered as `service`.
    Restate { url: String, service: String },
    /// In-process engine; jobs do not survive a restart.
    Memory { workers: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineBackend {
    Restate,
    Memory,
}

impl FromStr for EngineBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restate" => Ok(Self::Restate),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown engine backend {other:?} (expected restate or memory)"),
        }
    }
}

/// Configuration of the HTTP façade, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub engine: EngineConfig,
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend: EngineBackend = lookup("ENGINE_BACKEND")
            .unwrap_or_else(|| "restate".to_string())
            .parse()
            .context("ENGINE_BACKEND must be restate or memory")?;

        let engine = match backend {
            EngineBackend::Restate => EngineConfig::Restate {
                url: lookup("ENGINE_URL").context("ENGINE_URL must be set")?,
                service: lookup("ENGINE_SERVICE").context("ENGINE_SERVICE must be set")?,
            },
            EngineBackend::Memory => EngineConfig::Memory {
                workers: lookup("MEMORY_ENGINE_WORKERS")
                    .unwrap_or_else(|| "16".to_string())
                    .parse()
                    .context("MEMORY_ENGINE_WORKERS must be a valid number")?,
            },
        };

        Ok(Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            engine,
            shutdown_grace: match lookup("SHUTDOWN_GRACE_SECS") {
                Some(secs) => Duration::from_secs(
                    secs.parse()
                        .context("SHUTDOWN_GRACE_SECS must be a valid number")?,
                ),
                None => SHUTDOWN_GRACE,
            },
        })
    }
}

/// Configuration of the Restate endpoint hosting the job workflow
#[derive(Debug, Clone)]
pub struct WorkflowServerConfig {
    pub port: u16,
    pub restate_identity_key: Option<String>,
}

impl WorkflowServerConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            port: lookup("WORKFLOW_SERVER_PORT")
                .unwrap_or_else(|| "9080".to_string())
                .parse()
                .context("WORKFLOW_SERVER_PORT must be a valid number")?,
            restate_identity_key: lookup("RESTATE_IDENTITY_KEY").filter(|key| !key.is_empty()),
        })
    }
}
