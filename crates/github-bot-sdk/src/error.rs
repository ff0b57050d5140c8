//! Error types for GitHub Bot SDK operations.
//!
//! Each layer of a delivery has its own error type so callers can tell a
//! forged request from a broken payload from a failing GitHub API:
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | [`AuthenticationError`] | signature verification | request is not from GitHub |
//! | [`MalformedPayloadError`] | event parsing | headers or body cannot be decoded |
//! | [`AuthError`] | JWT signing, token exchange | the app could not obtain credentials |
//! | [`ApiError`] | REST calls | GitHub returned an error or was unreachable |
//! | [`RouterError`] | handler registration | the handler table is inconsistent |

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::InstallationId;

/// Webhook authenticity failures.
///
/// Every variant means the request must be rejected without invoking a
/// handler.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// No webhook secret is configured, so no delivery can be trusted.
    #[error("Webhook secret is not configured")]
    MissingSecret,

    /// The request carries neither `X-Hub-Signature-256` nor `X-Hub-Signature`.
    #[error("Missing webhook signature header")]
    MissingSignature,

    /// The signature header is not `<algorithm>=<hex>`.
    #[error("Invalid signature format: {message}")]
    InvalidSignatureFormat { message: String },

    /// The computed digest does not match the supplied one.
    #[error("Webhook signature does not match payload")]
    SignatureMismatch,
}

/// Failures while decoding a verified webhook request into an event.
#[derive(Debug, Error)]
pub enum MalformedPayloadError {
    /// A required GitHub header is absent.
    #[error("Missing required header: {header}")]
    MissingHeader { header: &'static str },

    /// The request was sent with a content type GitHub does not use.
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// A form-encoded delivery without its `payload` field.
    #[error("Form-encoded delivery has no payload field")]
    MissingFormPayload,

    /// The body is not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is JSON but not an object.
    #[error("Webhook payload must be a JSON object")]
    NotAnObject,
}

/// Authentication-related errors for the app's own credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid private key format or data (non-retryable).
    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    /// JWT generation failed (non-retryable).
    #[error("JWT generation failed: {message}")]
    JwtGenerationFailed { message: String },

    /// Exchanging the app JWT for an installation token failed.
    #[error("Installation token exchange failed for installation {installation_id}: {source}")]
    TokenExchangeFailed {
        installation_id: InstallationId,
        #[source]
        source: Box<AuthError>,
    },

    /// GitHub rejected or failed the token request.
    #[error("GitHub API error: {0}")]
    ApiError(#[from] ApiError),
}

impl AuthError {
    /// Check if this error represents a transient condition that may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidPrivateKey { .. } => false,
            Self::JwtGenerationFailed { .. } => false,
            Self::TokenExchangeFailed { source, .. } => source.is_transient(),
            Self::ApiError(e) => e.is_transient(),
        }
    }
}

/// Errors during GitHub API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response from GitHub API.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Rate limit exceeded. Operations should wait until reset time.
    #[error("Rate limit exceeded. Reset at: {reset_at}")]
    RateLimitExceeded { reset_at: DateTime<Utc> },

    /// Request to GitHub API timed out.
    #[error("Request timeout")]
    Timeout,

    /// The request was rejected as invalid (422).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Authentication to GitHub API failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Authorization check failed (insufficient permissions).
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// A response body could not be decoded.
    #[error("Response decoding failed: {message}")]
    InvalidResponse { message: String },

    /// The HTTP client could not be built.
    #[error("Client configuration error: {message}")]
    Configuration { message: String },

    /// Failed to parse JSON response from GitHub API.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[source] reqwest::Error),
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429, or 403 with an exhausted quota)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimitExceeded { .. } => true,
            Self::Timeout => true,
            Self::InvalidRequest { .. } => false,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed => false,
            Self::NotFound => false,
            Self::InvalidResponse { .. } => false,
            Self::Configuration { .. } => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
        }
    }

    /// Check if this error is GitHub's "no such resource" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpClientError(e)
        }
    }
}

/// Handler registration errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The same `(event, action)` key was registered twice.
    #[error("A handler is already registered for {event}/{action}")]
    DuplicateRegistration { event: String, action: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
