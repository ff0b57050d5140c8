//! Greets new installations with a short-lived issue.
//!
//! For every repository in an `installation`/`created` delivery the bot opens
//! an issue thanking the installer and closes it straight away. Repositories
//! are independent: a failure on one is logged and the next is tried.

use async_trait::async_trait;
use github_bot_sdk::client::{CreateIssueRequest, UpdateIssueRequest};
use github_bot_sdk::{
    ApiError, EventHandler, GitHubClient, HandlerError, InstallationToken, WebhookEvent,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::errors::BotError;
use crate::handlers::installation_token;

#[derive(Debug, Deserialize)]
struct InstallationCreated {
    #[serde(default)]
    repositories: Vec<RepositoryRef>,
    sender: Sender,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct Sender {
    login: String,
}

/// Handler for `installation`/`created`.
#[derive(Debug, Clone)]
pub struct InstallationGreeter {
    bot_name: String,
}

impl InstallationGreeter {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }

    /// The issue posted in each repository, addressed to `installer`.
    pub fn greeting(&self, installer: &str) -> CreateIssueRequest {
        CreateIssueRequest {
            title: format!("{} was installed", self.bot_name),
            body: Some(format!(
                "Thanks for installing me, @{}! (I'm a bot).",
                installer
            )),
            labels: None,
        }
    }

    async fn greet_repository(
        &self,
        client: &GitHubClient,
        full_name: &str,
        greeting: &CreateIssueRequest,
        token: &InstallationToken,
    ) -> Result<u64, ApiError> {
        let issue = client.create_issue(full_name, greeting, token).await?;
        client
            .update_issue_by_url(&issue.url, &UpdateIssueRequest::close(), token)
            .await?;
        Ok(issue.number)
    }
}

#[async_trait]
impl EventHandler<GitHubClient> for InstallationGreeter {
    #[instrument(skip(self, event, client), fields(delivery_id = %event.delivery_id()))]
    async fn handle(&self, event: &WebhookEvent, client: &GitHubClient) -> Result<(), HandlerError> {
        let payload: InstallationCreated =
            event
                .payload_as()
                .map_err(|source| BotError::InvalidPayload {
                    event: "installation",
                    source,
                })?;

        let token = installation_token(event, client).await?;
        let greeting = self.greeting(&payload.sender.login);

        let mut greeted = 0usize;
        let mut failed = 0usize;
        for repository in &payload.repositories {
            match self
                .greet_repository(client, &repository.full_name, &greeting, &token)
                .await
            {
                Ok(number) => {
                    greeted += 1;
                    info!(
                        repository = %repository.full_name,
                        issue = number,
                        "Posted and closed installation greeting"
                    );
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        repository = %repository.full_name,
                        error = %e,
                        "Could not greet repository; continuing"
                    );
                }
            }
        }

        info!(
            installer = %payload.sender.login,
            greeted,
            failed,
            "Installation greeting complete"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;
