use super::*;
use owners_bot_api::ConfigError;

#[test]
fn test_exit_codes() {
    let bind = ServiceError::BindFailed {
        address: "0.0.0.0:80".to_string(),
        message: "permission denied".to_string(),
    };
    let server = ServiceError::ServerFailed {
        message: "accept failed".to_string(),
    };
    let config = ServiceError::Configuration(ConfigError::Missing {
        key: "github.app_id".to_string(),
    });

    assert_eq!(exit_code(&bind), 1);
    assert_eq!(exit_code(&server), 2);
    assert_eq!(exit_code(&config), 3);
}

#[test]
fn test_invalid_level_is_rejected_by_filter() {
    std::env::remove_var("RUST_LOG");
    let logging = LoggingConfig {
        level: "info,owners_bot=notalevel".to_string(),
        json_format: false,
    };

    let error = log_filter(&logging).unwrap_err();
    assert!(format!("{:#}", error).contains("notalevel"));
}

/// A bad level still installs a subscriber instead of leaving the service
/// without logs.
#[test]
fn test_invalid_level_falls_back_to_info() {
    std::env::remove_var("RUST_LOG");
    let logging = LoggingConfig {
        level: "warn,owners_bot=notalevel".to_string(),
        json_format: false,
    };

    assert!(init_tracing(&logging).is_ok());
    assert!(tracing::enabled!(tracing::Level::INFO));
    assert!(!tracing::enabled!(tracing::Level::DEBUG));
}
