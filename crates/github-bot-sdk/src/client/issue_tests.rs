//! Tests for issue operations.

use super::*;
use crate::auth::{GitHubAppId, InstallationId, JsonWebToken, JwtGenerator};
use crate::client::ClientConfig;
use crate::error::AuthError;
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct UnusedJwtGenerator;

#[async_trait::async_trait]
impl JwtGenerator for UnusedJwtGenerator {
    fn app_id(&self) -> GitHubAppId {
        GitHubAppId::new(1)
    }

    async fn generate_jwt(&self) -> Result<JsonWebToken, AuthError> {
        Err(AuthError::JwtGenerationFailed {
            message: "Not used by issue operations".to_string(),
        })
    }
}

fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::builder(Arc::new(UnusedJwtGenerator))
        .config(ClientConfig::default().with_github_api_url(server.uri()))
        .build()
        .unwrap()
}

fn token() -> InstallationToken {
    InstallationToken::new(
        "ghs_issue".to_string(),
        InstallationId::new(5),
        Utc::now() + Duration::hours(1),
    )
}

fn issue_json(server: &MockServer, state: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "node_id": "MDU6SXNzdWUx",
        "number": 1347,
        "url": format!("{}/repos/octocat/Hello-World/issues/1347", server.uri()),
        "html_url": "https://github.com/octocat/Hello-World/issues/1347",
        "title": "owners-bot was installed",
        "body": "Thanks for installing me, @octocat! (I'm a bot).",
        "state": state,
        "user": {"login": "owners-bot[bot]"}
    })
}

mod construction {
    use super::*;

    #[test]
    fn test_create_request_omits_unset_fields() {
        let request = CreateIssueRequest {
            title: "Bug report".to_string(),
            body: None,
            labels: None,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"title": "Bug report"})
        );
    }

    #[test]
    fn test_close_request_only_sets_state() {
        assert_eq!(
            serde_json::to_value(UpdateIssueRequest::close()).unwrap(),
            json!({"state": "closed"})
        );
    }
}

mod operations {
    use super::*;

    #[tokio::test]
    async fn test_create_issue_posts_to_repository() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/Hello-World/issues"))
            .and(header("authorization", "Bearer ghs_issue"))
            .and(body_json(json!({
                "title": "owners-bot was installed",
                "body": "Thanks for installing me, @octocat! (I'm a bot)."
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(&server, "open")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = CreateIssueRequest {
            title: "owners-bot was installed".to_string(),
            body: Some("Thanks for installing me, @octocat! (I'm a bot).".to_string()),
            labels: None,
        };

        let issue = client
            .create_issue("octocat/Hello-World", &request, &token())
            .await
            .unwrap();

        assert_eq!(issue.number, 1347);
        assert_eq!(issue.state, "open");
        assert!(issue.url.ends_with("/repos/octocat/Hello-World/issues/1347"));
    }

    #[tokio::test]
    async fn test_update_issue_by_url_patches_returned_url() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octocat/Hello-World/issues/1347"))
            .and(body_json(json!({"state": "closed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(&server, "closed")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/repos/octocat/Hello-World/issues/1347", server.uri());

        let issue = client
            .update_issue_by_url(&url, &UpdateIssueRequest::close(), &token())
            .await
            .unwrap();

        assert_eq!(issue.state, "closed");
    }

    #[tokio::test]
    async fn test_create_issue_with_issues_disabled_is_gone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/archived/issues"))
            .respond_with(
                ResponseTemplate::new(410).set_body_json(json!({"message": "Issues are disabled for this repo"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = CreateIssueRequest {
            title: "t".to_string(),
            body: None,
            labels: None,
        };

        let error = client
            .create_issue("octocat/archived", &request, &token())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ApiError::HttpError { status: 410, ref message } if message == "Issues are disabled for this repo"
        ));
    }
}
