//! Tests for webhook request decoding.

use super::*;
use serde_json::json;

fn request(headers: &[(&str, &str)], body: &str) -> WebhookRequest {
    let headers = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>();
    WebhookRequest::new(headers, Bytes::from(body.to_string()))
}

fn github_headers(event: &str) -> Vec<(&str, &str)> {
    vec![
        ("X-GitHub-Event", event),
        ("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958"),
    ]
}

mod request_tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = request(&github_headers("issues"), "{}");

        assert_eq!(req.header("x-github-event"), Some("issues"));
        assert_eq!(req.header("X-GITHUB-EVENT"), Some("issues"));
        assert_eq!(
            req.delivery_id(),
            Some("72d3162e-cc78-11e3-81ab-4c9367dc0958")
        );
    }

    #[test]
    fn test_missing_header_is_none() {
        let req = request(&[], "{}");
        assert_eq!(req.event_type(), None);
    }
}

mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_json_body() {
        let req = request(
            &github_headers("pull_request"),
            r#"{"action":"opened","number":7,"installation":{"id":42}}"#,
        );

        let event = WebhookEvent::parse(&req).expect("valid delivery should parse");

        assert_eq!(event.name(), "pull_request");
        assert_eq!(event.action(), Some("opened"));
        assert_eq!(event.delivery_id(), "72d3162e-cc78-11e3-81ab-4c9367dc0958");
        assert_eq!(event.payload()["number"], 7);
    }

    #[test]
    fn test_parse_json_with_charset_parameter() {
        let mut headers = github_headers("ping");
        headers.push(("Content-Type", "application/json; charset=utf-8"));
        let req = request(&headers, r#"{"zen":"Keep it logically awesome."}"#);

        let event = WebhookEvent::parse(&req).unwrap();

        assert_eq!(event.name(), "ping");
        assert_eq!(event.action(), None);
    }

    #[test]
    fn test_parse_form_encoded_body() {
        let mut headers = github_headers("issues");
        headers.push(("content-type", "application/x-www-form-urlencoded"));
        let body = format!(
            "payload={}",
            url::form_urlencoded::byte_serialize(br#"{"action":"closed","issue":{"number":3}}"#)
                .collect::<String>()
        );
        let req = request(&headers, &body);

        let event = WebhookEvent::parse(&req).unwrap();

        assert_eq!(event.action(), Some("closed"));
        assert_eq!(event.payload()["issue"]["number"], 3);
    }

    #[test]
    fn test_form_body_without_payload_field_is_malformed() {
        let mut headers = github_headers("issues");
        headers.push(("content-type", "application/x-www-form-urlencoded"));
        let req = request(&headers, "other=1");

        assert!(matches!(
            WebhookEvent::parse(&req),
            Err(MalformedPayloadError::MissingFormPayload)
        ));
    }

    #[test]
    fn test_missing_event_header_is_malformed() {
        let req = request(&[("x-github-delivery", "abc")], "{}");

        assert!(matches!(
            WebhookEvent::parse(&req),
            Err(MalformedPayloadError::MissingHeader {
                header: EVENT_HEADER
            })
        ));
    }

    #[test]
    fn test_missing_delivery_header_is_malformed() {
        let req = request(&[("x-github-event", "push")], "{}");

        assert!(matches!(
            WebhookEvent::parse(&req),
            Err(MalformedPayloadError::MissingHeader {
                header: DELIVERY_HEADER
            })
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let req = request(&github_headers("push"), "{not json");

        assert!(matches!(
            WebhookEvent::parse(&req),
            Err(MalformedPayloadError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_json_array_is_malformed() {
        let req = request(&github_headers("push"), "[1,2,3]");

        assert!(matches!(
            WebhookEvent::parse(&req),
            Err(MalformedPayloadError::NotAnObject)
        ));
    }

    #[test]
    fn test_unsupported_content_type_is_malformed() {
        let mut headers = github_headers("push");
        headers.push(("content-type", "text/plain"));
        let req = request(&headers, "{}");

        assert!(matches!(
            WebhookEvent::parse(&req),
            Err(MalformedPayloadError::UnsupportedContentType { ref content_type })
                if content_type == "text/plain"
        ));
    }

    #[test]
    fn test_non_string_action_is_ignored() {
        let event = WebhookEvent::new("custom", "d-1", json!({"action": 5}));
        assert_eq!(event.action(), None);
    }
}

mod accessor_tests {
    use super::*;

    #[test]
    fn test_installation_with_access_tokens_url() {
        let event = WebhookEvent::new(
            "installation",
            "d-1",
            json!({
                "action": "created",
                "installation": {
                    "id": 1234,
                    "access_tokens_url": "https://api.github.com/app/installations/1234/access_tokens"
                }
            }),
        );

        let installation = event.installation().expect("installation present");

        assert_eq!(installation.id, InstallationId::new(1234));
        assert_eq!(
            installation.access_tokens_url.as_deref(),
            Some("https://api.github.com/app/installations/1234/access_tokens")
        );
    }

    #[test]
    fn test_installation_without_access_tokens_url() {
        let event = WebhookEvent::new(
            "pull_request",
            "d-2",
            json!({"action": "opened", "installation": {"id": 99, "node_id": "MDIz"}}),
        );

        let installation = event.installation().unwrap();

        assert_eq!(installation.id, InstallationId::new(99));
        assert!(installation.access_tokens_url.is_none());
    }

    #[test]
    fn test_ping_has_no_installation() {
        let event = WebhookEvent::new("ping", "d-3", json!({"zen": "Approachable is better than simple."}));
        assert!(event.installation().is_none());
    }

    #[test]
    fn test_payload_as_typed_view() {
        #[derive(Deserialize)]
        struct Sender {
            login: String,
        }
        #[derive(Deserialize)]
        struct View {
            sender: Sender,
        }

        let event = WebhookEvent::new("issues", "d-4", json!({"sender": {"login": "octocat"}}));
        let view: View = event.payload_as().unwrap();

        assert_eq!(view.sender.login, "octocat");
    }
}
