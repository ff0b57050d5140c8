//! # Owners-Bot Service
//!
//! Binary entry point for the owners-bot webhook receiver.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Loads the GitHub App private key
//! - Starts the HTTP server from owners-bot-api
//!
//! Exit codes: 1 when the listener cannot bind, 2 when the server fails
//! while running, 3 for any configuration problem.

use anyhow::Context;
use owners_bot_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_BIND_FAILED: i32 = 1;
const EXIT_SERVER_FAILED: i32 = 2;
const EXIT_CONFIG_ERROR: i32 = 3;

#[tokio::main]
async fn main() {
    // Logging is configured from the loaded config, so a load failure is
    // reported through a default subscriber.
    let loaded = ServiceConfig::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&logging) {
        eprintln!("{:#}", e);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let jwt = match config.github.jwt_generator() {
        Ok(jwt) => jwt,
        Err(e) => {
            error!(error = %e, "Could not load GitHub App credentials; aborting");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    info!(
        app_id = ?config.github.app_id,
        api_url = %config.github.api_url,
        endpoint = %config.webhook.endpoint_path,
        "Starting owners-bot service"
    );

    if let Err(e) = start_server(config, Arc::new(jwt)).await {
        error!(error = %e, "Service stopped with an error");
        std::process::exit(exit_code(&e));
    }
}

const FALLBACK_LOG_LEVEL: &str = "info";

/// Filter from `RUST_LOG`, else the configured level.
fn log_filter(logging: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("Invalid log level '{}'", logging.level))
}

/// Install the global subscriber. An unusable level falls back to
/// [`FALLBACK_LOG_LEVEL`] so the service never runs silent.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let (filter, rejected) = match log_filter(logging) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(FALLBACK_LOG_LEVEL), Some(e)),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.context("Failed to install tracing subscriber")?;

    if let Some(e) = rejected {
        warn!(
            error = %format!("{:#}", e),
            fallback = FALLBACK_LOG_LEVEL,
            "Ignoring invalid log level"
        );
    }
    Ok(())
}

fn exit_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::BindFailed { .. } => EXIT_BIND_FAILED,
        ServiceError::ServerFailed { .. } => EXIT_SERVER_FAILED,
        ServiceError::Configuration(_) | ServiceError::HandlerRegistration(_) => {
            EXIT_CONFIG_ERROR
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
