//! Commit status operations for the GitHub API.
//!
//! A commit status with a given `context` shows up as a check on every pull
//! request whose head is that commit, and branch protection can require it.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::InstallationToken;
use crate::client::GitHubClient;
use crate::error::ApiError;

/// State of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Error,
    Failure,
    Pending,
    Success,
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Failure => "failure",
            Self::Pending => "pending",
            Self::Success => "success",
        };
        write!(f, "{}", s)
    }
}

/// Request to create a commit status.
#[derive(Debug, Clone, Serialize)]
pub struct CreateStatusRequest {
    pub state: StatusState,

    /// Label distinguishing this status from others on the same commit
    pub context: String,

    /// Short description; GitHub rejects more than [`MAX_DESCRIPTION_CHARS`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

/// Longest status description GitHub accepts, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 140;

impl CreateStatusRequest {
    pub fn new(state: StatusState, context: impl Into<String>) -> Self {
        Self {
            state,
            context: context.into(),
            description: None,
            target_url: None,
        }
    }

    /// Set the description, shortened with a trailing ellipsis when it is
    /// longer than [`MAX_DESCRIPTION_CHARS`].
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let description = if description.chars().count() > MAX_DESCRIPTION_CHARS {
            let mut short: String = description
                .chars()
                .take(MAX_DESCRIPTION_CHARS - 1)
                .collect();
            short.push('…');
            short
        } else {
            description
        };
        self.description = Some(description);
        self
    }
}

/// A commit status as returned by GitHub.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitStatus {
    pub id: u64,
    pub state: StatusState,
    pub context: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl GitHubClient {
    /// Set a status on commit `sha` in `owner/repo`.
    #[instrument(skip(self, full_name, request, token), fields(repository = %full_name, state = %request.state))]
    pub async fn create_commit_status(
        &self,
        full_name: &str,
        sha: &str,
        request: &CreateStatusRequest,
        token: &InstallationToken,
    ) -> Result<CommitStatus, ApiError> {
        let path = format!("repos/{}/statuses/{}", full_name, sha);
        self.send_json(Method::POST, &path, token.token(), request)
            .await
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
