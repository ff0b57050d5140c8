//! Webhook signature validation implementation.
//!
//! Provides HMAC signature validation for GitHub webhooks using constant-time
//! comparison to prevent timing attacks. `X-Hub-Signature-256` (HMAC-SHA256)
//! is preferred; the legacy `X-Hub-Signature` (HMAC-SHA1) header is only
//! consulted when the SHA-256 header is absent.

use crate::error::AuthenticationError;
use crate::webhook::WebhookRequest;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Header carrying the HMAC-SHA256 signature.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Legacy header carrying the HMAC-SHA1 signature.
pub const SIGNATURE_SHA1_HEADER: &str = "x-hub-signature";

/// Validates GitHub webhook signatures.
///
/// # Security
///
/// - Uses constant-time comparison to prevent timing attacks
/// - Never logs secrets or signature values
/// - Validates signature format before HMAC computation
///
/// # Examples
///
/// ```rust
/// use github_bot_sdk::webhook::{SignatureValidator, WebhookRequest};
/// use github_bot_sdk::AuthenticationError;
/// use std::collections::HashMap;
///
/// let validator = SignatureValidator::new(Some("It's a Secret to Everybody".to_string()));
/// let request = WebhookRequest::new(HashMap::new(), bytes::Bytes::from_static(b"{}"));
///
/// assert!(matches!(
///     validator.verify(&request),
///     Err(AuthenticationError::MissingSignature)
/// ));
/// ```
#[derive(Clone)]
pub struct SignatureValidator {
    secret: Option<String>,
}

/// Digest algorithms GitHub signs deliveries with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureAlgorithm {
    Sha256,
    Sha1,
}

impl SignatureAlgorithm {
    fn prefix(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256=",
            Self::Sha1 => "sha1=",
        }
    }
}

impl SignatureValidator {
    /// Create a new signature validator.
    ///
    /// An empty secret is treated the same as no secret.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Check whether a secret is configured.
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify that a request was signed by GitHub with the configured secret.
    ///
    /// # Errors
    ///
    /// - `MissingSecret` if no secret is configured
    /// - `MissingSignature` if neither signature header is present
    /// - `InvalidSignatureFormat` if the header is not `<algorithm>=<hex>`
    /// - `SignatureMismatch` if the digest does not match the body
    pub fn verify(&self, request: &WebhookRequest) -> Result<(), AuthenticationError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(AuthenticationError::MissingSecret)?;

        let (algorithm, header_value) = if let Some(sig) = request.header(SIGNATURE_256_HEADER) {
            (SignatureAlgorithm::Sha256, sig)
        } else if let Some(sig) = request.header(SIGNATURE_SHA1_HEADER) {
            (SignatureAlgorithm::Sha1, sig)
        } else {
            return Err(AuthenticationError::MissingSignature);
        };

        let supplied = parse_signature(algorithm, header_value)?;
        let expected = compute_hmac(algorithm, request.body(), secret)
            .ok_or(AuthenticationError::SignatureMismatch)?;

        if constant_time_compare(&supplied, &expected) {
            Ok(())
        } else {
            Err(AuthenticationError::SignatureMismatch)
        }
    }
}

/// Extracts the digest bytes from a `<algorithm>=<hex>` header value.
fn parse_signature(
    algorithm: SignatureAlgorithm,
    signature: &str,
) -> Result<Vec<u8>, AuthenticationError> {
    let prefix = algorithm.prefix();
    let hex_signature = signature.trim().strip_prefix(prefix).ok_or_else(|| {
        AuthenticationError::InvalidSignatureFormat {
            message: format!("Signature must start with '{}'", prefix),
        }
    })?;

    hex::decode(hex_signature).map_err(|e| AuthenticationError::InvalidSignatureFormat {
        message: format!("Invalid hex encoding in signature: {}", e),
    })
}

fn compute_hmac(algorithm: SignatureAlgorithm, payload: &[u8], secret: &str) -> Option<Vec<u8>> {
    match algorithm {
        SignatureAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
            mac.update(payload);
            Some(mac.finalize().into_bytes().to_vec())
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).ok()?;
            mac.update(payload);
            Some(mac.finalize().into_bytes().to_vec())
        }
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    // Length is not secret, so the early return is safe.
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

// Security: Don't expose secrets in debug output
impl std::fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureValidator")
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
