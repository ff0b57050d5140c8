//! Event routing from `(event, action)` keys to handlers.
//!
//! Each key maps to exactly one handler. A handler registered with
//! [`ActionFilter::Any`] is the fallback for every action of its event that
//! has no exact registration. Dispatch invokes at most one handler.

use crate::error::RouterError;
use crate::webhook::{EventHandler, HandlerError, WebhookEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Which actions of an event a handler accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionFilter {
    /// Only deliveries whose payload `action` equals this value.
    Exact(String),
    /// Any action, including deliveries without an `action` field.
    Any,
}

impl ActionFilter {
    /// Shorthand for [`ActionFilter::Exact`].
    pub fn exact(action: impl Into<String>) -> Self {
        Self::Exact(action.into())
    }
}

impl std::fmt::Display for ActionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(action) => write!(f, "{}", action),
            Self::Any => write!(f, "*"),
        }
    }
}

/// What dispatch did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran and succeeded.
    Handled,
    /// No handler is registered for the delivery.
    Unmatched,
}

/// Table of event handlers.
///
/// Built once at start-up and shared read-only across deliveries.
///
/// # Examples
///
/// ```rust
/// use github_bot_sdk::webhook::{ActionFilter, DispatchOutcome, EventHandler, HandlerError, Router, WebhookEvent};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct Noop;
///
/// #[async_trait]
/// impl EventHandler<()> for Noop {
///     async fn handle(&self, _event: &WebhookEvent, _ctx: &()) -> Result<(), HandlerError> {
///         Ok(())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let mut router: Router<()> = Router::new();
/// router.register("issues", ActionFilter::exact("opened"), Arc::new(Noop)).unwrap();
///
/// let event = WebhookEvent::new("issues", "d-1", serde_json::json!({"action": "opened"}));
/// assert_eq!(router.dispatch(&event, &()).await.unwrap(), DispatchOutcome::Handled);
/// # });
/// ```
pub struct Router<C> {
    handlers: HashMap<(String, ActionFilter), Arc<dyn EventHandler<C>>>,
}

impl<C> Router<C>
where
    C: Send + Sync,
{
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event and action filter.
    ///
    /// # Errors
    ///
    /// Returns `RouterError::DuplicateRegistration` if the key is already taken.
    pub fn register(
        &mut self,
        event: impl Into<String>,
        action: ActionFilter,
        handler: Arc<dyn EventHandler<C>>,
    ) -> Result<(), RouterError> {
        let key = (event.into(), action);
        if self.handlers.contains_key(&key) {
            return Err(RouterError::DuplicateRegistration {
                event: key.0,
                action: key.1.to_string(),
            });
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn lookup(&self, event: &WebhookEvent) -> Option<&Arc<dyn EventHandler<C>>> {
        let name = event.name().to_string();
        event
            .action()
            .and_then(|action| {
                self.handlers
                    .get(&(name.clone(), ActionFilter::Exact(action.to_string())))
            })
            .or_else(|| self.handlers.get(&(name, ActionFilter::Any)))
    }

    /// Dispatch an event to the matching handler.
    ///
    /// An exact action match wins over a wildcard registration.
    ///
    /// # Errors
    ///
    /// Returns the handler's error unchanged.
    #[instrument(skip(self, event, ctx), fields(event = %event.name(), action = ?event.action()))]
    pub async fn dispatch(
        &self,
        event: &WebhookEvent,
        ctx: &C,
    ) -> Result<DispatchOutcome, HandlerError> {
        match self.lookup(event) {
            Some(handler) => {
                handler.handle(event, ctx).await?;
                Ok(DispatchOutcome::Handled)
            }
            None => {
                debug!(delivery_id = %event.delivery_id(), "No handler registered");
                Ok(DispatchOutcome::Unmatched)
            }
        }
    }
}

impl<C> Default for Router<C>
where
    C: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self
            .handlers
            .keys()
            .map(|(event, action)| format!("{}/{}", event, action))
            .collect();
        keys.sort();
        f.debug_struct("Router").field("handlers", &keys).finish()
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
