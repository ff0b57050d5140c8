//! Common test utilities for owners-bot-api integration tests
//!
//! This module provides:
//! - A static JWT signer so no key material is needed
//! - A [`TestApp`] wiring the real handlers to a mocked GitHub API
//! - Builders for signed webhook deliveries

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
};
use chrono::{Duration, Utc};
use github_bot_sdk::auth::JwtGenerator;
use github_bot_sdk::{AuthError, GitHubAppId, JsonWebToken};
use hmac::{Hmac, Mac};
use owners_bot_api::{create_router, AppState, ServiceConfig};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SECRET: &str = "integration-secret";
pub const INSTALLATION_ID: u64 = 42;
pub const INSTALLATION_TOKEN: &str = "ghs_integration";
pub const APP_JWT: &str = "integration.app.jwt";

// ============================================================================
// Credentials
// ============================================================================

pub struct StaticJwt;

#[async_trait::async_trait]
impl JwtGenerator for StaticJwt {
    fn app_id(&self) -> GitHubAppId {
        GitHubAppId::new(99)
    }

    async fn generate_jwt(&self) -> Result<JsonWebToken, AuthError> {
        Ok(JsonWebToken::new(
            APP_JWT.to_string(),
            GitHubAppId::new(99),
            Utc::now() + Duration::minutes(10),
        ))
    }
}

// ============================================================================
// Application under test
// ============================================================================

/// The HTTP app with its GitHub API pointed at a mock server.
pub struct TestApp {
    pub github: MockServer,
    pub config: ServiceConfig,
}

impl TestApp {
    pub async fn start() -> Self {
        let github = MockServer::start().await;

        let mut config = ServiceConfig::default();
        config.github.api_url = github.uri();
        config.github.app_id = Some(99);
        config.webhook.secret = Some(SECRET.to_string());
        config.webhook.dispatch_delay_ms = 0;

        Self { github, config }
    }

    /// Send one request through a freshly built router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        let state = AppState::new(self.config.clone(), Arc::new(StaticJwt))
            .expect("handlers should register");
        create_router(state)
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Deliver a signed webhook.
    pub async fn deliver(&self, event: &str, payload: &Value) -> Response<Body> {
        self.send(signed_delivery(event, "delivery-1", payload)).await
    }

    /// Every request the mocked GitHub API received, as `METHOD path`.
    pub async fn github_calls(&self) -> Vec<String> {
        self.github
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }

    pub fn token_path(&self) -> String {
        format!("/app/installations/{}/access_tokens", INSTALLATION_ID)
    }

    /// Answer the installation token exchange.
    pub async fn mount_token_exchange(&self) {
        Mock::given(method("POST"))
            .and(path(self.token_path()))
            .and(header("authorization", format!("Bearer {}", APP_JWT).as_str()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": INSTALLATION_TOKEN,
                "expires_at": "2030-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&self.github)
            .await;
    }

    /// Fail the installation token exchange.
    pub async fn mount_token_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(self.token_path()))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.github)
            .await;
    }
}

// ============================================================================
// Deliveries
// ============================================================================

pub fn signature(body: &[u8], secret: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// A delivery signed with [`SECRET`].
pub fn signed_delivery(event: &str, delivery_id: &str, payload: &Value) -> Request<Body> {
    let body = payload.to_string();
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("user-agent", "GitHub-Hookshot/044aadd")
        .header("x-github-event", event)
        .header("x-github-delivery", delivery_id)
        .header("x-hub-signature-256", signature(body.as_bytes(), SECRET))
        .body(Body::from(body))
        .expect("valid request")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body")
        .to_vec()
}
