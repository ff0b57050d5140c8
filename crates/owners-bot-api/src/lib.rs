//! # Owners-Bot HTTP Service
//!
//! HTTP server for receiving GitHub App webhooks and acting on them.
//!
//! This service provides:
//! - `GET /`: a plain-text liveness greeting
//! - `POST /webhook`: signature-verified webhook intake, dispatched to the
//!   handlers in [`handlers`]
//!
//! A delivery answers `200 OK` once its handler has finished, including for
//! `ping` and for events no handler is registered for. Every failure answers
//! `500` with an empty body so GitHub redelivers it.

pub mod config;
pub mod errors;
pub mod handlers;

pub use config::{
    BotConfig, GitHubConfig, LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig,
};
pub use errors::{BotError, ConfigError, ServiceError, WebhookHandlerError};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use github_bot_sdk::auth::JwtGenerator;
use github_bot_sdk::webhook::{Router as EventRouter, DELIVERY_HEADER};
use github_bot_sdk::{
    DispatchOutcome, GitHubClient, ResponseCache, SignatureValidator, WebhookEvent,
    WebhookRequest,
};
use std::{collections::HashMap, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument, warn};

/// Header carrying the request's correlation id in responses.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
///
/// Everything here is built once at start-up and only read afterwards. The
/// GitHub client is not: each delivery gets its own session.
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Verifies delivery signatures against the webhook secret
    pub validator: Arc<SignatureValidator>,

    /// Handler table, keyed by event and action
    pub router: Arc<EventRouter<GitHubClient>>,

    /// Signs the app JWTs each session exchanges for installation tokens
    pub jwt: Arc<dyn JwtGenerator>,

    /// Conditional-GET cache shared by all sessions
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    /// Create application state with the bot's standard handlers.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::HandlerRegistration` if the handler table is
    /// inconsistent.
    pub fn new(config: ServiceConfig, jwt: Arc<dyn JwtGenerator>) -> Result<Self, ServiceError> {
        let router = handlers::register_handlers(&config.bot)?;
        Ok(Self::with_router(config, jwt, router))
    }

    /// Create application state around a caller-supplied handler table.
    pub fn with_router(
        config: ServiceConfig,
        jwt: Arc<dyn JwtGenerator>,
        router: EventRouter<GitHubClient>,
    ) -> Self {
        let validator = SignatureValidator::new(config.webhook.secret.clone());
        let cache = Arc::new(ResponseCache::new(config.github.cache_capacity));

        Self {
            config: Arc::new(config),
            validator: Arc::new(validator),
            router: Arc::new(router),
            jwt,
            cache,
        }
    }

    /// Open the GitHub session for one delivery.
    fn new_session(&self) -> Result<GitHubClient, WebhookHandlerError> {
        GitHubClient::builder(self.jwt.clone())
            .config(self.config.github.client_config())
            .cache(self.cache.clone())
            .build()
            .map_err(WebhookHandlerError::Session)
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .route("/", get(handle_root))
        .route(&state.config.webhook.endpoint_path, post(handle_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Serves until SIGINT or SIGTERM, then lets in-flight deliveries finish.
pub async fn start_server(
    config: ServiceConfig,
    jwt: Arc<dyn JwtGenerator>,
) -> Result<(), ServiceError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, jwt)?;
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

// ============================================================================
// Request Handlers
// ============================================================================

async fn handle_root() -> &'static str {
    "Hello world"
}

/// Handle GitHub webhook requests
///
/// 1. Verify the signature against the configured secret
/// 2. Parse the delivery into a [`WebhookEvent`]
/// 3. Answer `ping` straight away
/// 4. Open a GitHub session, wait the configured dispatch delay, and run the
///    matching handler to completion
#[instrument(skip(state, headers, body), fields(event, action, delivery_id))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookHandlerError> {
    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();
    let request = WebhookRequest::new(header_map, body);

    state.validator.verify(&request)?;
    let event = WebhookEvent::parse(&request)?;

    let span = tracing::Span::current();
    span.record("event", event.name());
    span.record("delivery_id", event.delivery_id());
    if let Some(action) = event.action() {
        span.record("action", action);
    }

    if event.name() == "ping" {
        info!("Received ping");
        return Ok(StatusCode::OK);
    }

    let client = state.new_session()?;

    let delay = state.config.webhook.dispatch_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let outcome = state
        .router
        .dispatch(&event, &client)
        .await
        .map_err(|source| WebhookHandlerError::Handler {
            event: event.name().to_string(),
            source,
        })?;

    match outcome {
        DispatchOutcome::Handled => info!("Webhook handled"),
        DispatchOutcome::Unmatched => debug!("No handler registered; ignoring"),
    }

    if let Some(rate_limit) = client.rate_limit() {
        if rate_limit.is_exhausted() {
            warn!(reset_at = %rate_limit.reset_at(), "GitHub rate limit exhausted");
        }
        info!(
            remaining = rate_limit.remaining(),
            limit = rate_limit.limit(),
            "GitHub requests remaining"
        );
    }

    Ok(StatusCode::OK)
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// Tags each request with a correlation id: the GitHub delivery id when the
/// request has one, otherwise a fresh UUID. The id is echoed in the
/// `x-correlation-id` response header.
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(DELIVERY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(correlation_id.clone());

    debug!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
