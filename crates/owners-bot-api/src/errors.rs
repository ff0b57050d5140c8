//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use github_bot_sdk::{
    ApiError, AuthError, AuthenticationError, HandlerError, MalformedPayloadError, RouterError,
};
use tracing::error;

/// Failures inside the bot's event handlers.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The delivery has no `installation` section, so no token can be fetched.
    #[error("Event has no installation")]
    MissingInstallation,

    /// The payload lacks a field the handler needs.
    #[error("Invalid {event} payload: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The installation token could not be obtained.
    #[error(transparent)]
    Token(#[from] AuthError),

    /// A GitHub call whose failure ends the delivery.
    #[error("{operation} failed: {source}")]
    Api {
        operation: String,
        #[source]
        source: ApiError,
    },
}

/// Webhook handler errors
///
/// GitHub redelivers webhooks that fail with a server error, so every variant
/// maps to `500 Internal Server Error` with an empty body. Each message
/// embeds its cause, so the logged text is the whole chain. Nothing about it
/// is returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// The request is not signed with the configured secret.
    #[error("Webhook authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Headers or body could not be decoded into an event.
    #[error("Malformed webhook: {0}")]
    MalformedPayload(#[from] MalformedPayloadError),

    /// The per-delivery GitHub client could not be built.
    #[error("Could not create GitHub session: {0}")]
    Session(#[source] ApiError),

    /// The matched handler failed.
    #[error("Handler for {event} failed: {source}")]
    Handler {
        event: String,
        #[source]
        source: HandlerError,
    },
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let chain = self.to_string();

        match self {
            Self::Authentication(_) => {
                error!(error = %chain, "Rejected webhook with invalid signature")
            }
            Self::MalformedPayload(_) => error!(error = %chain, "Rejected malformed webhook"),
            Self::Session(_) | Self::Handler { .. } => {
                error!(error = %chain, "Webhook processing failed")
            }
        }

        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Handler registration failed: {0}")]
    HandlerRegistration(#[from] RouterError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Invalid value in {name}: {message}")]
    LegacyVariable { name: String, message: String },

    #[error("Cannot read private key file {path}: {message}")]
    KeyFile { path: String, message: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
