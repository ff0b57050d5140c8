//! # GitHub Bot SDK
//!
//! Building blocks for GitHub Apps that react to webhook deliveries.
//!
//! This SDK provides:
//! - Webhook signature verification (HMAC-SHA256, legacy HMAC-SHA1)
//! - Webhook event parsing into [`webhook::WebhookEvent`]
//! - An `(event, action)` keyed handler [`webhook::Router`]
//! - GitHub App JWT signing and installation token exchange
//! - A per-delivery REST client with rate-limit tracking and an advisory
//!   conditional-GET response cache
//!
//! # Examples
//!
//! ## Verifying and parsing a delivery
//!
//! ```rust
//! use github_bot_sdk::webhook::{SignatureValidator, WebhookEvent, WebhookRequest};
//! use std::collections::HashMap;
//!
//! let headers = HashMap::from([
//!     ("x-github-event".to_string(), "ping".to_string()),
//!     ("x-github-delivery".to_string(), "72d3162e".to_string()),
//! ]);
//! let request = WebhookRequest::new(headers, bytes::Bytes::from_static(b"{\"zen\":\"Keep it logically awesome.\"}"));
//!
//! // No signature header: verification fails before the payload is looked at.
//! let validator = SignatureValidator::new(Some("secret".to_string()));
//! assert!(validator.verify(&request).is_err());
//!
//! let event = WebhookEvent::parse(&request).unwrap();
//! assert_eq!(event.name(), "ping");
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod webhook;

// Re-export commonly used types at crate root for convenience
pub use error::{
    ApiError, AuthError, AuthenticationError, MalformedPayloadError, RouterError, ValidationError,
};

pub use auth::{GitHubAppId, InstallationId, InstallationToken, JsonWebToken, PrivateKey};
pub use client::{ClientConfig, GitHubClient, RateLimit, ResponseCache};
pub use webhook::{
    ActionFilter, DispatchOutcome, EventHandler, HandlerError, Router, SignatureValidator,
    WebhookEvent, WebhookRequest,
};
