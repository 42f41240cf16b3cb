//! Rolling-window rate limiting with a concurrency ceiling.
//!
//! [`RateLimiter`] admits remote calls under two independent constraints: at
//! most `max_calls_per_window` admissions within the trailing `window`, and
//! at most `max_concurrency` calls in flight at once. One limiter instance is
//! shared by every coordinator talking to the same provider, so the ceilings
//! hold globally, not per batch.
//!
//! Admission hands back a [`LimiterPermit`]; dropping it returns the
//! concurrency slot, so release happens on every exit path — success,
//! failure, or panic — without the caller doing anything.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;

/// Configuration for the rate limiter.
///
/// ```rust
/// # use muninn::LimiterConfig;
/// # use std::time::Duration;
/// let config = LimiterConfig::new()
///     .max_calls_per_window(30)
///     .window(Duration::from_secs(60))
///     .max_concurrency(4);
/// ```
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Admissions allowed within the trailing window. Default: 60.
    pub max_calls_per_window: usize,
    /// Length of the rolling window. Default: 60s.
    pub window: Duration,
    /// Simultaneous in-flight calls. Default: 8.
    pub max_concurrency: usize,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_calls_per_window: 60,
            window: Duration::from_secs(60),
            max_concurrency: 8,
        }
    }
}

impl LimiterConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of admissions allowed within the trailing window.
    pub fn max_calls_per_window(mut self, n: usize) -> Self {
        self.max_calls_per_window = n;
        self
    }

    /// Set the length of the rolling window.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the maximum number of simultaneous in-flight calls.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }
}

/// Proof of admission for one remote call.
///
/// Holds the concurrency slot until dropped. Keep it alive for the duration
/// of the call, including retries of the same logical call.
#[must_use = "dropping the permit immediately releases the concurrency slot"]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

/// Admission control over a shared remote provider.
///
/// The concurrency gate is a tokio semaphore (FIFO-fair, so waiters are
/// served in arrival order). The window gate keeps the timestamps of past
/// admissions and sleeps until the oldest one ages out; the timestamp mutex
/// is only held for pruning and recording, never across a sleep or a call.
pub struct RateLimiter {
    config: LimiterConfig,
    concurrency: Arc<Semaphore>,
    admissions: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter from a config. Zero ceilings are clamped to one —
    /// a limiter that can never admit anything would deadlock its callers.
    pub fn new(config: LimiterConfig) -> Self {
        let config = LimiterConfig {
            max_calls_per_window: config.max_calls_per_window.max(1),
            max_concurrency: config.max_concurrency.max(1),
            ..config
        };
        let concurrency = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            config,
            concurrency,
            admissions: Mutex::new(VecDeque::new()),
        }
    }

    /// The effective configuration (after clamping).
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Wait until both ceilings allow another remote call.
    ///
    /// Suspends the caller; there is no error path. Cancel-safe: aborting
    /// the wait records nothing and leaks no slot. On admission a timestamp
    /// is recorded and the returned permit holds the concurrency slot.
    pub async fn acquire(&self) -> LimiterPermit {
        let start = Instant::now();
        let permit = self
            .concurrency
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");

        loop {
            let wait_until = self.try_admit();
            match wait_until {
                None => break,
                Some(deadline) => {
                    debug!(
                        wait_ms = deadline.saturating_duration_since(Instant::now()).as_millis()
                            as u64,
                        "window full, waiting for admission"
                    );
                    tokio::time::sleep_until(deadline).await;
                }
            }
        }

        metrics::histogram!(telemetry::LIMITER_WAIT_SECONDS)
            .record(start.elapsed().as_secs_f64());
        LimiterPermit { _permit: permit }
    }

    /// Record an admission if the window has room, else return the earliest
    /// instant at which it might.
    fn try_admit(&self) -> Option<Instant> {
        let now = Instant::now();
        let mut admissions = self.admissions.lock().unwrap();
        while let Some(oldest) = admissions.front() {
            if now.duration_since(*oldest) >= self.config.window {
                admissions.pop_front();
            } else {
                break;
            }
        }
        if admissions.len() < self.config.max_calls_per_window {
            admissions.push_back(now);
            None
        } else {
            // Non-empty here: len >= max_calls_per_window >= 1.
            admissions.front().map(|oldest| *oldest + self.config.window)
        }
    }

    /// Calls currently admitted but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.config.max_concurrency - self.concurrency.available_permits()
    }

    /// Admissions still counted against the trailing window.
    pub fn window_occupancy(&self) -> usize {
        let now = Instant::now();
        let mut admissions = self.admissions.lock().unwrap();
        while let Some(oldest) = admissions.front() {
            if now.duration_since(*oldest) >= self.config.window {
                admissions.pop_front();
            } else {
                break;
            }
        }
        admissions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ceilings_are_clamped() {
        let limiter = RateLimiter::new(
            LimiterConfig::new().max_calls_per_window(0).max_concurrency(0),
        );
        assert_eq!(limiter.config().max_calls_per_window, 1);
        assert_eq!(limiter.config().max_concurrency, 1);
    }

    #[test]
    fn config_defaults() {
        let config = LimiterConfig::default();
        assert_eq!(config.max_calls_per_window, 60);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.max_concurrency, 8);
    }
}
