//! Retry configuration, backoff calculation, and the shared retry driver.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! [`with_retry()`] — the single place retry logic lives. The driver is a
//! pure decorator around one async operation: it knows nothing about rate
//! limiting or caching, and reports how many attempts a call took so the
//! coordinator can surface that per item.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::MuninnError;
use crate::telemetry;
use crate::Result;

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff with optional jitter:
///
/// ```rust
/// # use muninn::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(200))
///     .jitter(true);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 1s.
    pub base_delay: Duration,
    /// Backoff growth factor per retry. Default: 2.
    pub multiplier: u32,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
    /// Whether to add random jitter (±20%) to delays. Default: true.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the backoff growth factor.
    pub fn multiplier(mut self, factor: u32) -> Self {
        self.multiplier = factor;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Calculate the delay for a given retry (0-indexed: 0 is the delay
    /// before the second attempt).
    ///
    /// Exponential backoff: `base_delay * multiplier^attempt`, capped at
    /// `max_delay`. Does NOT include jitter — see
    /// [`effective_delay()`](Self::effective_delay) for the full calculation.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .base_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Calculate the effective delay, respecting provider `retry_after` hints.
    ///
    /// A `retry_after` duration (from a `RateLimited` error) takes precedence
    /// over the calculated backoff and is used as-is. The calculated backoff
    /// gets ±20% jitter when enabled, spreading otherwise-synchronized
    /// retries across concurrent callers.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint,
            None => {
                let delay = self.delay_for_attempt(attempt);
                if self.jitter { apply_jitter(delay) } else { delay }
            }
        }
    }
}

/// Bounded random perturbation: scales the delay by a factor in [0.8, 1.2].
fn apply_jitter(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.8..=1.2);
    delay.mul_f64(factor)
}

/// Result of a retried operation plus how many tries it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    /// Attempts actually made, counting the first. At least 1, at most
    /// `max_attempts`.
    pub attempts: u32,
}

impl<T> Attempted<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Execute an async operation with retry logic.
///
/// Retries on transient errors (as classified by
/// [`MuninnError::is_transient()`]) up to `config.max_attempts`, using
/// exponential backoff and respecting `retry_after` hints from `RateLimited`
/// errors. Terminal errors return after a single attempt with no delay.
/// On exhaustion the last error is returned — never silently swallowed.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: &str, f: F) -> Attempted<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match f().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt + 1,
                };
            }
            Err(e) if e.is_transient() => {
                if attempt + 1 < max_attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation.to_owned())
                        .increment(1);
                    let delay = config.effective_delay(attempt, e.retry_after());
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => {
                return Attempted {
                    result: Err(e),
                    attempts: attempt + 1,
                };
            }
        }
    }
    Attempted {
        // The loop ran at least once and only falls through on a transient
        // error, so last_err is populated; the fallback is unreachable.
        result: Err(last_err
            .unwrap_or_else(|| MuninnError::Configuration("retry loop made no attempts".into()))),
        attempts: max_attempts,
    }
}
