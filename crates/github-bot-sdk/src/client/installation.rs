//! Installation access token exchange.
//!
//! The app signs a JWT and trades it for a token scoped to one installation.
//! Tokens are fetched per handler invocation and never cached.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::auth::{InstallationId, InstallationToken};
use crate::client::GitHubClient;
use crate::error::AuthError;

/// Body of `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl GitHubClient {
    /// Obtain an installation access token.
    ///
    /// Uses `access_tokens_url` verbatim when the delivery carried one, and
    /// otherwise builds `{api}/app/installations/{id}/access_tokens`.
    ///
    /// # Errors
    ///
    /// Every failure, including JWT signing, transport errors, timeouts and
    /// non-2xx responses, is reported as `AuthError::TokenExchangeFailed`.
    #[instrument(skip(self, installation_id, access_tokens_url), fields(installation_id = %installation_id))]
    pub async fn create_installation_access_token(
        &self,
        installation_id: InstallationId,
        access_tokens_url: Option<&str>,
    ) -> Result<InstallationToken, AuthError> {
        let wrap = |source: AuthError| AuthError::TokenExchangeFailed {
            installation_id,
            source: Box::new(source),
        };

        let jwt = self.jwt_generator().generate_jwt().await.map_err(wrap)?;

        let url = match access_tokens_url {
            Some(url) => url.to_string(),
            None => format!("app/installations/{}/access_tokens", installation_id),
        };

        let response: InstallationTokenResponse = self
            .send_json(Method::POST, &url, jwt.token(), &serde_json::json!({}))
            .await
            .map_err(|e| wrap(AuthError::ApiError(e)))?;

        debug!(expires_at = %response.expires_at, "Obtained installation token");

        Ok(InstallationToken::new(
            response.token,
            installation_id,
            response.expires_at,
        ))
    }
}

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;
