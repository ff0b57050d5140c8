//! GitHub webhook intake: authenticity, decoding, and routing.
//!
//! A delivery flows through three steps:
//!
//! 1. [`SignatureValidator::verify`] checks the HMAC signature against the raw body
//! 2. [`WebhookEvent::parse`] decodes headers and body into an event
//! 3. [`Router::dispatch`] invokes the handler registered for `(event, action)`
//!
//! # Example
//!
//! ```rust
//! use github_bot_sdk::webhook::{
//!     ActionFilter, DispatchOutcome, EventHandler, HandlerError, Router, SignatureValidator,
//!     WebhookEvent, WebhookRequest,
//! };
//! use async_trait::async_trait;
//! use hmac::{Hmac, Mac};
//! use sha2::Sha256;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl EventHandler<()> for Greeter {
//!     async fn handle(&self, event: &WebhookEvent, _ctx: &()) -> Result<(), HandlerError> {
//!         println!("installed via {}", event.delivery_id());
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let secret = "hunter2";
//! let body = br#"{"action":"created","installation":{"id":1}}"#;
//! let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
//! mac.update(body);
//! let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
//!
//! let request = WebhookRequest::new(
//!     HashMap::from([
//!         ("x-github-event".to_string(), "installation".to_string()),
//!         ("x-github-delivery".to_string(), "d-1".to_string()),
//!         ("x-hub-signature-256".to_string(), signature),
//!     ]),
//!     bytes::Bytes::from_static(body),
//! );
//!
//! let mut router: Router<()> = Router::new();
//! router.register("installation", ActionFilter::exact("created"), Arc::new(Greeter)).unwrap();
//!
//! SignatureValidator::new(Some(secret.to_string())).verify(&request).unwrap();
//! let event = WebhookEvent::parse(&request).unwrap();
//! assert_eq!(router.dispatch(&event, &()).await.unwrap(), DispatchOutcome::Handled);
//! # });
//! ```

pub mod event;
pub mod handler;
pub mod router;
pub mod validation;

pub use event::{InstallationRef, WebhookEvent, WebhookRequest, DELIVERY_HEADER, EVENT_HEADER};
pub use handler::{EventHandler, HandlerError};
pub use router::{ActionFilter, DispatchOutcome, Router};
pub use validation::SignatureValidator;
