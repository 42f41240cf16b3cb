//! Muninn error types and failure classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    // Transport-level errors
    #[error("remote call timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Data errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The call succeeded at the transport level but the response could not
    /// be decoded. Terminal for the affected item; siblings continue.
    #[error("unparseable response: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Opaque failure surfaced by the injected backend. Classified by a
    /// message heuristic since the backend's own error type is unknown here.
    #[error("backend error: {0}")]
    Backend(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MuninnError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts, connection failures, explicit throttling, and 5xx-equivalent
    /// API errors are transient. Validation, authentication, and decode
    /// failures are not — repeating the same call cannot fix them.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited { .. } | Self::Connection(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Backend(message) => {
                let message = message.to_ascii_lowercase();
                message.contains("timeout")
                    || message.contains("timed out")
                    || message.contains("connection reset")
                    || message.contains("connection refused")
                    || message.contains("temporarily unavailable")
            }
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    ///
    /// Only `RateLimited` carries one; the retry driver lets it override the
    /// computed exponential delay.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Coarse class for per-item batch reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) | Self::Json(_) => ErrorKind::Parse,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            e if e.is_transient() => ErrorKind::Transient,
            _ => ErrorKind::Terminal,
        }
    }
}

/// Coarse failure class attached to a failed batch item.
///
/// `Parse` and `Terminal` items will fail the same way on a re-run;
/// `RateLimited` and `Transient` items are worth re-submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    RateLimited,
    Transient,
    Terminal,
}

impl ErrorKind {
    /// Stable lowercase name, used as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse_error",
            Self::RateLimited => "rate_limited",
            Self::Transient => "transient",
            Self::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
