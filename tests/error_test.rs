use std::time::Duration;

use muninn::{ErrorKind, MuninnError, Result};

#[test]
fn test_error_display() {
    let err = MuninnError::InvalidInput("empty payload".to_string());
    assert!(err.to_string().contains("empty payload"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(MuninnError::AuthenticationFailed)
    }
    assert!(returns_error().is_err());
}

// ============================================================================
// Transient error classification
// ============================================================================

#[test]
fn transient_errors() {
    assert!(MuninnError::Timeout.is_transient());
    assert!(MuninnError::RateLimited { retry_after: None }.is_transient());
    assert!(
        MuninnError::RateLimited {
            retry_after: Some(Duration::from_secs(1))
        }
        .is_transient()
    );
    assert!(MuninnError::Connection("connection reset".into()).is_transient());
    assert!(
        MuninnError::Api {
            status: 500,
            message: "internal".into()
        }
        .is_transient()
    );
    assert!(
        MuninnError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient()
    );
}

#[test]
fn terminal_errors() {
    assert!(!MuninnError::AuthenticationFailed.is_transient());
    assert!(!MuninnError::InvalidInput("x".into()).is_transient());
    assert!(!MuninnError::Parse("garbled".into()).is_transient());
    assert!(!MuninnError::Configuration("x".into()).is_transient());
    assert!(
        !MuninnError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_transient()
    );
    assert!(
        !MuninnError::Api {
            status: 401,
            message: "unauth".into()
        }
        .is_transient()
    );
    assert!(
        !MuninnError::Api {
            status: 404,
            message: "not found".into()
        }
        .is_transient()
    );
}

#[test]
fn backend_error_transient_heuristic() {
    // network-sounding messages are transient
    assert!(MuninnError::Backend("connection reset by peer".into()).is_transient());
    assert!(MuninnError::Backend("request timed out".into()).is_transient());
    assert!(MuninnError::Backend("connection refused".into()).is_transient());
    // generic messages are not
    assert!(!MuninnError::Backend("unknown analysis kind".into()).is_transient());
}

// ============================================================================
// retry_after extraction
// ============================================================================

#[test]
fn retry_after_from_rate_limited() {
    let duration = Duration::from_secs(5);
    let err = MuninnError::RateLimited {
        retry_after: Some(duration),
    };
    assert_eq!(err.retry_after(), Some(duration));
}

#[test]
fn retry_after_none_when_not_specified() {
    let err = MuninnError::RateLimited { retry_after: None };
    assert_eq!(err.retry_after(), None);
}

#[test]
fn retry_after_none_for_non_rate_limit_errors() {
    assert_eq!(MuninnError::Timeout.retry_after(), None);
    assert_eq!(MuninnError::AuthenticationFailed.retry_after(), None);
}

// ============================================================================
// ErrorKind mapping for per-item reporting
// ============================================================================

#[test]
fn kind_parse() {
    assert_eq!(MuninnError::Parse("garbled".into()).kind(), ErrorKind::Parse);
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    assert_eq!(MuninnError::Json(json_err).kind(), ErrorKind::Parse);
}

#[test]
fn kind_rate_limited() {
    assert_eq!(
        MuninnError::RateLimited { retry_after: None }.kind(),
        ErrorKind::RateLimited
    );
}

#[test]
fn kind_transient() {
    assert_eq!(MuninnError::Timeout.kind(), ErrorKind::Transient);
    assert_eq!(
        MuninnError::Connection("reset".into()).kind(),
        ErrorKind::Transient
    );
    assert_eq!(
        MuninnError::Api {
            status: 502,
            message: "bad gateway".into()
        }
        .kind(),
        ErrorKind::Transient
    );
}

#[test]
fn kind_terminal() {
    assert_eq!(MuninnError::AuthenticationFailed.kind(), ErrorKind::Terminal);
    assert_eq!(
        MuninnError::InvalidInput("x".into()).kind(),
        ErrorKind::Terminal
    );
    assert_eq!(
        MuninnError::Api {
            status: 422,
            message: "unprocessable".into()
        }
        .kind(),
        ErrorKind::Terminal
    );
}

#[test]
fn kind_label_names() {
    assert_eq!(ErrorKind::Parse.as_str(), "parse_error");
    assert_eq!(ErrorKind::RateLimited.as_str(), "rate_limited");
    assert_eq!(ErrorKind::Transient.to_string(), "transient");
    assert_eq!(ErrorKind::Terminal.to_string(), "terminal");
}
