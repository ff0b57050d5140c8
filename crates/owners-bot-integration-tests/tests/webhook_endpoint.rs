//! Integration tests for the webhook endpoint's request handling.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_root_returns_greeting() {
    let app = TestApp::start().await;

    let response = app
        .send(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Hello world");
}

/// A ping is acknowledged and never reaches GitHub.
#[tokio::test]
async fn test_ping_is_acknowledged_without_api_calls() {
    let app = TestApp::start().await;

    let response = app
        .deliver(
            "ping",
            &json!({ "zen": "Approachable is better than simple.", "hook_id": 1 }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.github_calls().await.is_empty());
}

/// Signatures computed with the wrong secret are rejected before any work.
#[tokio::test]
async fn test_wrong_secret_is_rejected_without_api_calls() {
    let app = TestApp::start().await;
    let payload = json!({
        "action": "created",
        "installation": { "id": INSTALLATION_ID },
        "repositories": [{ "full_name": "org/repo1" }],
        "sender": { "login": "octocat" }
    });
    let body = payload.to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("x-github-event", "installation")
        .header("x-github-delivery", "forged")
        .header("x-hub-signature-256", signature(body.as_bytes(), "not-the-secret"))
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
    assert!(app.github_calls().await.is_empty());
}

/// A body altered after signing no longer matches its signature.
#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let app = TestApp::start().await;
    let signed = json!({ "action": "opened", "number": 1 }).to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("x-github-event", "pull_request")
        .header("x-github-delivery", "tampered")
        .header("x-hub-signature-256", signature(signed.as_bytes(), SECRET))
        .body(Body::from(json!({ "action": "opened", "number": 2 }).to_string()))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.github_calls().await.is_empty());
}

#[tokio::test]
async fn test_unsigned_delivery_is_rejected() {
    let app = TestApp::start().await;

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("x-github-event", "ping")
        .header("x-github-delivery", "unsigned")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_missing_event_header_is_rejected() {
    let app = TestApp::start().await;
    let body = "{}";

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("x-github-delivery", "no-event")
        .header("x-hub-signature-256", signature(body.as_bytes(), SECRET))
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Events nobody registered for succeed without touching GitHub.
#[tokio::test]
async fn test_unregistered_event_is_a_successful_noop() {
    let app = TestApp::start().await;

    for (event, action) in [
        ("issues", "opened"),
        ("installation", "deleted"),
        ("pull_request", "synchronize"),
    ] {
        let response = app
            .deliver(
                event,
                &json!({ "action": action, "installation": { "id": INSTALLATION_ID } }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{event}/{action}");
    }

    assert!(app.github_calls().await.is_empty());
}

/// GitHub's form-encoded content type carries the JSON in a `payload` field.
#[tokio::test]
async fn test_form_encoded_ping_is_accepted() {
    let app = TestApp::start().await;
    let body = "payload=%7B%22zen%22%3A%22Keep+it+logically+awesome.%22%7D";

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-github-event", "ping")
        .header("x-github-delivery", "form")
        .header("x-hub-signature-256", signature(body.as_bytes(), SECRET))
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_response_carries_delivery_as_correlation_id() {
    let app = TestApp::start().await;

    let response = app
        .send(signed_delivery("ping", "f00dbabe-0000", &json!({})))
        .await;

    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        "f00dbabe-0000"
    );
}
