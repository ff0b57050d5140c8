//! Issue operations for the GitHub API.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::InstallationToken;
use crate::client::GitHubClient;
use crate::error::ApiError;

/// GitHub issue.
///
/// Only the fields the bot acts on; GitHub sends many more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique issue identifier
    pub id: u64,

    /// Issue number (repository-specific)
    pub number: u64,

    /// API URL of the issue, used for follow-up updates
    pub url: String,

    /// Web URL of the issue
    pub html_url: String,

    /// Issue title
    pub title: String,

    /// Issue body content (Markdown)
    #[serde(default)]
    pub body: Option<String>,

    /// "open" or "closed"
    pub state: String,
}

/// Request to create a new issue.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest {
    /// Issue title (required)
    pub title: String,

    /// Issue body content (Markdown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Label names to apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Request to update an existing issue. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateIssueRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// "open" or "closed"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl UpdateIssueRequest {
    /// A request that only closes the issue.
    pub fn close() -> Self {
        Self {
            state: Some("closed".to_string()),
            ..Self::default()
        }
    }
}

impl GitHubClient {
    /// Create an issue in `owner/repo`.
    #[instrument(skip(self, full_name, request, token), fields(repository = %full_name))]
    pub async fn create_issue(
        &self,
        full_name: &str,
        request: &CreateIssueRequest,
        token: &InstallationToken,
    ) -> Result<Issue, ApiError> {
        let path = format!("repos/{}/issues", full_name);
        self.send_json(Method::POST, &path, token.token(), request)
            .await
    }

    /// Update an issue addressed by its API `url`.
    #[instrument(skip(self, request, token))]
    pub async fn update_issue_by_url(
        &self,
        url: &str,
        request: &UpdateIssueRequest,
        token: &InstallationToken,
    ) -> Result<Issue, ApiError> {
        self.send_json(Method::PATCH, url, token.token(), request)
            .await
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
