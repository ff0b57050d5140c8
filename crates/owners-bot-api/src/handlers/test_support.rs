//! Shared fixtures for handler tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use github_bot_sdk::auth::JwtGenerator;
use github_bot_sdk::{
    AuthError, ClientConfig, GitHubAppId, GitHubClient, JsonWebToken, WebhookEvent,
};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const INSTALLATION_ID: u64 = 42;
pub(crate) const INSTALLATION_TOKEN: &str = "ghs_installation";

pub(crate) struct StaticJwt;

#[async_trait::async_trait]
impl JwtGenerator for StaticJwt {
    fn app_id(&self) -> GitHubAppId {
        GitHubAppId::new(7)
    }

    async fn generate_jwt(&self) -> Result<JsonWebToken, AuthError> {
        Ok(JsonWebToken::new(
            "app.jwt".to_string(),
            GitHubAppId::new(7),
            Utc::now() + Duration::minutes(10),
        ))
    }
}

pub(crate) fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::builder(Arc::new(StaticJwt))
        .config(ClientConfig::default().with_github_api_url(server.uri()))
        .build()
        .expect("client should build")
}

pub(crate) fn token_path() -> String {
    format!("/app/installations/{}/access_tokens", INSTALLATION_ID)
}

/// Answer the token exchange for [`INSTALLATION_ID`] exactly once.
pub(crate) async fn mount_token_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(token_path()))
        .and(header("authorization", "Bearer app.jwt"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": INSTALLATION_TOKEN,
            "expires_at": "2030-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub(crate) fn event(name: &str, payload: Value) -> WebhookEvent {
    WebhookEvent::new(name, "delivery-1", payload)
}
