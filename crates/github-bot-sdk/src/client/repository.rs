//! Repository content operations for the GitHub API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::InstallationToken;
use crate::client::GitHubClient;
use crate::error::ApiError;

/// A file as returned by the contents API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    /// "file", "dir", "symlink" or "submodule"
    #[serde(rename = "type")]
    pub content_type: String,

    pub name: String,
    pub path: String,
    pub sha: String,
    pub size: u64,

    /// Usually "base64"
    #[serde(default)]
    pub encoding: Option<String>,

    /// Encoded file content, wrapped at 60 characters by GitHub
    #[serde(default)]
    pub content: Option<String>,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "type")]
    pub content_type: String,
    pub name: String,
    pub path: String,
}

/// What the contents API returns for a path.
///
/// GitHub answers a directory with a JSON array of its entries and anything
/// else with a single object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryContent {
    // Must stay first: a derived struct also accepts a sequence.
    Directory(Vec<DirectoryEntry>),
    Entry(FileContent),
}

impl RepositoryContent {
    /// The entry when the path names a regular file.
    pub fn into_file(self) -> Option<FileContent> {
        match self {
            Self::Entry(file) if file.content_type == "file" => Some(file),
            _ => None,
        }
    }
}

impl FileContent {
    /// Decode the file body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidResponse` if the entry carries no content, uses
    /// an unknown encoding, or is not valid base64 UTF-8.
    pub fn decoded_content(&self) -> Result<String, ApiError> {
        let content = self
            .content
            .as_deref()
            .ok_or_else(|| ApiError::InvalidResponse {
                message: format!("{} has no inline content", self.path),
            })?;

        match self.encoding.as_deref() {
            Some("base64") | None => {}
            Some(other) => {
                return Err(ApiError::InvalidResponse {
                    message: format!("Unsupported content encoding: {}", other),
                })
            }
        }

        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| ApiError::InvalidResponse {
                message: format!("Invalid base64 content in {}: {}", self.path, e),
            })?;

        String::from_utf8(bytes).map_err(|e| ApiError::InvalidResponse {
            message: format!("{} is not valid UTF-8: {}", self.path, e),
        })
    }
}

impl GitHubClient {
    /// Fetch a path from the default branch of `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the path does not exist.
    #[instrument(skip(self, full_name, token), fields(repository = %full_name))]
    pub async fn get_file_contents(
        &self,
        full_name: &str,
        path: &str,
        token: &InstallationToken,
    ) -> Result<RepositoryContent, ApiError> {
        let path = format!(
            "repos/{}/contents/{}",
            full_name,
            path.trim_start_matches('/')
        );
        self.get_json(&path, token.token()).await
    }
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
