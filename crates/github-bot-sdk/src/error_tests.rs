//! Tests for error classification.

use super::*;

mod api_error_tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let error = ApiError::HttpError {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_secondary_rate_limit_is_transient() {
        let error = ApiError::HttpError {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_client_errors_are_permanent() {
        assert!(!ApiError::NotFound.is_transient());
        assert!(!ApiError::AuthorizationFailed.is_transient());
        assert!(!ApiError::InvalidRequest {
            message: "Validation Failed".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(ApiError::Timeout.is_transient());
    }

    #[test]
    fn test_only_not_found_reports_not_found() {
        assert!(ApiError::NotFound.is_not_found());
        assert!(!ApiError::HttpError {
            status: 404,
            message: "proxied".to_string()
        }
        .is_not_found());
        assert!(!ApiError::AuthorizationFailed.is_not_found());
    }
}

mod auth_error_tests {
    use super::*;

    #[test]
    fn test_token_exchange_inherits_transience_from_source() {
        let transient = AuthError::TokenExchangeFailed {
            installation_id: InstallationId::new(42),
            source: Box::new(AuthError::ApiError(ApiError::Timeout)),
        };
        assert!(transient.is_transient());

        let permanent = AuthError::TokenExchangeFailed {
            installation_id: InstallationId::new(42),
            source: Box::new(AuthError::ApiError(ApiError::AuthenticationFailed)),
        };
        assert!(!permanent.is_transient());
    }

    #[test]
    fn test_token_exchange_message_names_installation() {
        let error = AuthError::TokenExchangeFailed {
            installation_id: InstallationId::new(42),
            source: Box::new(AuthError::ApiError(ApiError::NotFound)),
        };
        assert_eq!(
            error.to_string(),
            "Installation token exchange failed for installation 42: \
             GitHub API error: Resource not found"
        );
    }

    #[test]
    fn test_invalid_key_is_permanent() {
        let error = AuthError::InvalidPrivateKey {
            message: "bad".to_string(),
        };
        assert!(!error.is_transient());
    }
}

mod router_error_tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_message() {
        let error = RouterError::DuplicateRegistration {
            event: "installation".to_string(),
            action: "created".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "A handler is already registered for installation/created"
        );
    }
}
