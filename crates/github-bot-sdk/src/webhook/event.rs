//! Webhook request and event types.
//!
//! A [`WebhookRequest`] is the raw HTTP delivery. A [`WebhookEvent`] is what
//! is left once the delivery has been decoded: the event name from
//! `X-GitHub-Event`, the delivery id, and the JSON payload.

use crate::auth::InstallationId;
use crate::error::MalformedPayloadError;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Header naming the event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

const CONTENT_TYPE_HEADER: &str = "content-type";

// ============================================================================
// Webhook Request
// ============================================================================

/// Raw HTTP webhook request data.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
///
/// # Examples
///
/// ```rust
/// use github_bot_sdk::webhook::WebhookRequest;
/// use std::collections::HashMap;
///
/// let headers = HashMap::from([
///     ("X-GitHub-Event".to_string(), "pull_request".to_string()),
///     ("X-GitHub-Delivery".to_string(), "12345".to_string()),
/// ]);
/// let request = WebhookRequest::new(headers, bytes::Bytes::from_static(b"{}"));
///
/// assert_eq!(request.event_type(), Some("pull_request"));
/// assert_eq!(request.header("x-github-delivery"), Some("12345"));
/// ```
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl WebhookRequest {
    /// Create a new webhook request.
    pub fn new(headers: HashMap<String, String>, body: Bytes) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self { headers, body }
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Get the event type from the `X-GitHub-Event` header.
    pub fn event_type(&self) -> Option<&str> {
        self.header(EVENT_HEADER)
    }

    /// Get the delivery ID from the `X-GitHub-Delivery` header.
    pub fn delivery_id(&self) -> Option<&str> {
        self.header(DELIVERY_HEADER)
    }

    /// Get the raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get all headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

// ============================================================================
// Webhook Event
// ============================================================================

/// Installation reference carried in app webhook payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallationRef {
    pub id: InstallationId,

    /// Only present on `installation` events.
    #[serde(default)]
    pub access_tokens_url: Option<String>,
}

/// A decoded GitHub webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    name: String,
    delivery_id: String,
    action: Option<String>,
    payload: Value,
}

impl WebhookEvent {
    /// Create an event directly from its parts.
    pub fn new(name: impl Into<String>, delivery_id: impl Into<String>, payload: Value) -> Self {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            name: name.into(),
            delivery_id: delivery_id.into(),
            action,
            payload,
        }
    }

    /// Decode a webhook request into an event.
    ///
    /// The body is read as JSON unless the request declares
    /// `application/x-www-form-urlencoded`, in which case the JSON document is
    /// taken from the `payload` form field.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayloadError` if a required header is missing, the
    /// content type is unsupported, or the body is not a JSON object.
    pub fn parse(request: &WebhookRequest) -> Result<Self, MalformedPayloadError> {
        let name = request
            .event_type()
            .ok_or(MalformedPayloadError::MissingHeader {
                header: EVENT_HEADER,
            })?;
        let delivery_id = request
            .delivery_id()
            .ok_or(MalformedPayloadError::MissingHeader {
                header: DELIVERY_HEADER,
            })?;

        let payload: Value = match media_type(request.header(CONTENT_TYPE_HEADER)).as_deref() {
            None | Some("application/json") => serde_json::from_slice(request.body())?,
            Some("application/x-www-form-urlencoded") => {
                let document = url::form_urlencoded::parse(request.body())
                    .find(|(key, _)| key == "payload")
                    .map(|(_, value)| value.into_owned())
                    .ok_or(MalformedPayloadError::MissingFormPayload)?;
                serde_json::from_str(&document)?
            }
            Some(other) => {
                return Err(MalformedPayloadError::UnsupportedContentType {
                    content_type: other.to_string(),
                })
            }
        };

        if !payload.is_object() {
            return Err(MalformedPayloadError::NotAnObject);
        }

        Ok(Self::new(name, delivery_id, payload))
    }

    /// The event name, e.g. `pull_request`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The payload's `action`, if it has one.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The installation the delivery was sent for.
    ///
    /// `None` for deliveries that do not belong to an installation, such as
    /// the `ping` sent when a hook is first configured.
    pub fn installation(&self) -> Option<InstallationRef> {
        self.payload
            .get("installation")
            .and_then(|v| InstallationRef::deserialize(v).ok())
    }

    /// Deserialize the payload into a typed view.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

/// Lower-cases a content type and strips parameters such as `charset`.
fn media_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty())
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
