//! Webhook handler trait for application-provided processing logic.
//!
//! Handlers are registered with a [`Router`](crate::webhook::Router) under an
//! `(event, action)` key and receive the decoded event together with a
//! per-delivery context, normally the GitHub client session for the delivery.
//!
//! # Examples
//!
//! ```rust
//! use github_bot_sdk::webhook::{EventHandler, HandlerError, WebhookEvent};
//! use async_trait::async_trait;
//!
//! struct LogStars;
//!
//! #[async_trait]
//! impl EventHandler<()> for LogStars {
//!     async fn handle(&self, event: &WebhookEvent, _ctx: &()) -> Result<(), HandlerError> {
//!         println!("starred via delivery {}", event.delivery_id());
//!         Ok(())
//!     }
//! }
//! ```

use crate::webhook::WebhookEvent;
use async_trait::async_trait;
use std::error::Error;

/// Error type returned by handlers.
///
/// Handlers fail for reasons the router knows nothing about, so errors cross
/// the router boundary type-erased.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Application-provided webhook event handler.
///
/// # Error Handling
///
/// A returned error fails the whole delivery. Handlers that can partially
/// succeed should log per-item failures themselves and return `Ok(())`.
#[async_trait]
pub trait EventHandler<C>: Send + Sync
where
    C: Send + Sync,
{
    /// Handle one decoded delivery.
    async fn handle(&self, event: &WebhookEvent, ctx: &C) -> Result<(), HandlerError>;
}
