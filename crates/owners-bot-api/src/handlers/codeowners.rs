//! CODEOWNERS gate for new pull requests.
//!
//! GitHub reads CODEOWNERS from one of three places and uses the first it
//! finds. The check probes them in the same order, lints what it finds, and
//! posts the verdict as a commit status on the pull request's head commit so
//! branch protection can require it.
//!
//! ```text
//! Probing(root) -> Probing(docs) -> Probing(.github) -> Found | NotFound
//!                                                        |        |
//!                                              lint ok? Allow    Block
//! ```
//!
//! Only a 404 moves on to the next location. Any other failure aborts the
//! delivery so GitHub retries it.

use std::fmt;

use async_trait::async_trait;
use github_bot_sdk::client::{CreateStatusRequest, StatusState};
use github_bot_sdk::{
    ApiError, EventHandler, GitHubClient, HandlerError, InstallationToken, WebhookEvent,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::errors::BotError;
use crate::handlers::installation_token;

/// Places GitHub looks for a CODEOWNERS file, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeownersLocation {
    Root,
    Docs,
    GitHub,
}

impl CodeownersLocation {
    pub const PROBE_ORDER: [Self; 3] = [Self::Root, Self::Docs, Self::GitHub];

    /// Repository-relative path of the file.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Root => "CODEOWNERS",
            Self::Docs => "docs/CODEOWNERS",
            Self::GitHub => ".github/CODEOWNERS",
        }
    }
}

impl fmt::Display for CodeownersLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of reading one candidate location.
#[derive(Debug)]
pub enum ProbeOutcome {
    Found(String),
    NotFound,
    Failed(ApiError),
}

/// Whether the pull request may merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow { description: String },
    Block { description: String },
}

impl Verdict {
    /// Decide from the first CODEOWNERS file found, if any.
    pub fn from_probe(found: Option<(CodeownersLocation, &str)>) -> Self {
        match found {
            None => Self::Block {
                description: "No CODEOWNERS file in the repository root, docs/ or .github/"
                    .to_string(),
            },
            Some((location, content)) => match lint(content) {
                Ok(rules) => Self::Allow {
                    description: format!("{} defines {} ownership rule(s)", location, rules),
                },
                Err(e) => Self::Block {
                    description: format!("{} is invalid: {}", location, e),
                },
            },
        }
    }

    pub fn state(&self) -> StatusState {
        match self {
            Self::Allow { .. } => StatusState::Success,
            Self::Block { .. } => StatusState::Failure,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Allow { description } | Self::Block { description } => description,
        }
    }
}

/// A CODEOWNERS line GitHub would not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintError {
    /// 1-based line number; 0 when the problem is the file as a whole
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "line {}: {}", self.line, self.message)
        }
    }
}

impl std::error::Error for LintError {}

/// Check that every owner on every rule is well formed.
///
/// A pattern with no owners is allowed; GitHub uses it to un-own paths that
/// an earlier rule matched. Returns the number of rules that assign owners,
/// and rejects a file where that number is zero.
pub fn lint(content: &str) -> Result<usize, LintError> {
    let mut rules = 0;

    for (index, raw) in content.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        let owners: Vec<&str> = line.split_whitespace().skip(1).collect();

        if owners.is_empty() {
            continue;
        }
        if let Some(bad) = owners.iter().find(|owner| !is_valid_owner(owner)) {
            return Err(LintError {
                line: index + 1,
                message: format!("'{}' is not a user, team or e-mail address", bad),
            });
        }

        rules += 1;
    }

    if rules == 0 {
        return Err(LintError {
            line: 0,
            message: "file defines no ownership rules".to_string(),
        });
    }

    Ok(rules)
}

/// Drop a `#` comment. An escaped `\#` is part of a pattern.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1] != b'\\') {
            return &line[..i];
        }
    }
    line
}

/// `@user`, `@org/team` or `user@example.com`.
fn is_valid_owner(owner: &str) -> bool {
    let is_name = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    };

    if let Some(handle) = owner.strip_prefix('@') {
        return match handle.split_once('/') {
            Some((org, team)) => is_name(org) && is_name(team),
            None => is_name(handle),
        };
    }

    match owner.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestOpened {
    pull_request: PullRequest,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    head: Head,
}

#[derive(Debug, Deserialize)]
struct Head {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
}

/// Handler for `pull_request`/`opened`.
#[derive(Debug, Clone)]
pub struct CodeownersCheck {
    status_context: String,
}

impl CodeownersCheck {
    pub fn new(status_context: impl Into<String>) -> Self {
        Self {
            status_context: status_context.into(),
        }
    }

    /// Read one candidate location. A directory or symlink at the path does
    /// not count as a file.
    pub async fn probe(
        client: &GitHubClient,
        full_name: &str,
        location: CodeownersLocation,
        token: &InstallationToken,
    ) -> ProbeOutcome {
        match client
            .get_file_contents(full_name, location.path(), token)
            .await
        {
            Ok(content) => match content.into_file() {
                Some(file) => match file.decoded_content() {
                    Ok(content) => ProbeOutcome::Found(content),
                    Err(e) => ProbeOutcome::Failed(e),
                },
                None => ProbeOutcome::NotFound,
            },
            Err(e) if e.is_not_found() => ProbeOutcome::NotFound,
            Err(e) => ProbeOutcome::Failed(e),
        }
    }

    /// Probe every location in order and stop at the first file found.
    ///
    /// # Errors
    ///
    /// Returns `BotError::Api` for the first probe that fails with anything
    /// other than 404.
    pub async fn find_codeowners(
        client: &GitHubClient,
        full_name: &str,
        token: &InstallationToken,
    ) -> Result<Option<(CodeownersLocation, String)>, BotError> {
        for location in CodeownersLocation::PROBE_ORDER {
            match Self::probe(client, full_name, location, token).await {
                ProbeOutcome::Found(content) => return Ok(Some((location, content))),
                ProbeOutcome::NotFound => {
                    debug!(repository = %full_name, path = location.path(), "No CODEOWNERS here");
                }
                ProbeOutcome::Failed(source) => {
                    return Err(BotError::Api {
                        operation: format!("Reading {}", location),
                        source,
                    })
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl EventHandler<GitHubClient> for CodeownersCheck {
    #[instrument(skip(self, event, client), fields(delivery_id = %event.delivery_id()))]
    async fn handle(&self, event: &WebhookEvent, client: &GitHubClient) -> Result<(), HandlerError> {
        let payload: PullRequestOpened =
            event
                .payload_as()
                .map_err(|source| BotError::InvalidPayload {
                    event: "pull_request",
                    source,
                })?;
        let full_name = &payload.repository.full_name;

        let token = installation_token(event, client).await?;

        let found = Self::find_codeowners(client, full_name, &token).await?;
        let verdict = Verdict::from_probe(
            found
                .as_ref()
                .map(|(location, content)| (*location, content.as_str())),
        );

        let request = CreateStatusRequest::new(verdict.state(), self.status_context.clone())
            .with_description(verdict.description());
        client
            .create_commit_status(full_name, &payload.pull_request.head.sha, &request, &token)
            .await
            .map_err(|source| BotError::Api {
                operation: "Posting commit status".to_string(),
                source,
            })?;

        info!(
            repository = %full_name,
            pull_request = payload.pull_request.number,
            state = %verdict.state(),
            description = verdict.description(),
            "Posted CODEOWNERS verdict"
        );

        Ok(())
    }
}

#[cfg(test)]
#[path = "codeowners_tests.rs"]
mod tests;
