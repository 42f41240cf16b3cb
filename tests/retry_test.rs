use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use muninn::{MuninnError, RetryConfig, with_retry};

// ============================================================================
// RetryConfig
// ============================================================================

#[test]
fn retry_config_defaults() {
    let config = RetryConfig::default();
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.base_delay, Duration::from_secs(1));
    assert_eq!(config.multiplier, 2);
    assert_eq!(config.max_delay, Duration::from_secs(30));
    assert!(config.jitter);
}

#[test]
fn retry_config_builder() {
    let config = RetryConfig::new()
        .max_attempts(5)
        .base_delay(Duration::from_millis(100))
        .multiplier(3)
        .max_delay(Duration::from_secs(10))
        .jitter(false);

    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.base_delay, Duration::from_millis(100));
    assert_eq!(config.multiplier, 3);
    assert_eq!(config.max_delay, Duration::from_secs(10));
    assert!(!config.jitter);
}

#[test]
fn retry_config_disabled() {
    let config = RetryConfig::disabled();
    assert_eq!(config.max_attempts, 1);
}

#[test]
fn retry_config_delay_calculation() {
    let config = RetryConfig::new()
        .base_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(10))
        .jitter(false);

    // Exponential backoff: 100ms, 200ms, 400ms, 800ms, ...
    assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
    assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
}

#[test]
fn retry_config_delay_honours_multiplier() {
    let config = RetryConfig::new()
        .base_delay(Duration::from_millis(100))
        .multiplier(3)
        .jitter(false);

    assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(config.delay_for_attempt(1), Duration::from_millis(300));
    assert_eq!(config.delay_for_attempt(2), Duration::from_millis(900));
}

#[test]
fn retry_config_delay_capped_at_max() {
    let config = RetryConfig::new()
        .base_delay(Duration::from_secs(1))
        .max_delay(Duration::from_secs(5))
        .jitter(false);

    // attempt 3 = 1 * 2^3 = 8s, but capped at 5s
    assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
}

#[test]
fn retry_config_respects_retry_after() {
    let config = RetryConfig::new()
        .base_delay(Duration::from_millis(100))
        .jitter(false);

    // retry_after from the provider overrides the calculated delay
    let delay = config.effective_delay(0, Some(Duration::from_secs(5)));
    assert_eq!(delay, Duration::from_secs(5));

    // without retry_after, uses the calculated delay
    let delay = config.effective_delay(0, None);
    assert_eq!(delay, Duration::from_millis(100));
}

#[test]
fn jitter_stays_within_bounds() {
    let config = RetryConfig::new()
        .base_delay(Duration::from_millis(1000))
        .jitter(true);

    for _ in 0..100 {
        let delay = config.effective_delay(0, None);
        assert!(delay >= Duration::from_millis(800), "delay {delay:?} below -20%");
        assert!(delay <= Duration::from_millis(1200), "delay {delay:?} above +20%");
    }
}

// ============================================================================
// with_retry driver
// ============================================================================

fn fast_config() -> RetryConfig {
    RetryConfig::new()
        .max_attempts(3)
        .base_delay(Duration::from_millis(1))
        .jitter(false)
}

#[tokio::test]
async fn succeeds_first_try() {
    let calls = AtomicU32::new(0);
    let attempted = with_retry(&fast_config(), "test", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, MuninnError>(42) }
    })
    .await;

    assert_eq!(attempted.result.unwrap(), 42);
    assert_eq!(attempted.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retries_on_transient_then_succeeds() {
    let calls = AtomicU32::new(0);
    let attempted = with_retry(&fast_config(), "test", || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(MuninnError::Connection("connection reset".into()))
            } else {
                Ok(7)
            }
        }
    })
    .await;

    assert_eq!(attempted.result.unwrap(), 7);
    assert_eq!(attempted.attempts, 3); // 2 failures + 1 success
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn backoff_delays_accumulate() {
    let config = RetryConfig::new()
        .max_attempts(3)
        .base_delay(Duration::from_millis(100))
        .jitter(false);
    let calls = AtomicU32::new(0);

    let start = tokio::time::Instant::now();
    let attempted = with_retry(&config, "test", || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(MuninnError::Timeout)
            } else {
                Ok(())
            }
        }
    })
    .await;

    assert!(attempted.is_ok());
    // delays: base (100ms) + base * multiplier (200ms)
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);
    let attempted = with_retry(&fast_config(), "test", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(MuninnError::Timeout) }
    })
    .await;

    assert!(attempted.result.is_err());
    assert_eq!(attempted.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3); // never more
}

#[tokio::test]
async fn exhaustion_returns_last_error() {
    let attempted = with_retry(&fast_config(), "test", || async {
        Err::<(), _>(MuninnError::Api {
            status: 503,
            message: "unavailable".into(),
        })
    })
    .await;

    match attempted.result {
        Err(MuninnError::Api { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected the last Api error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn terminal_error_short_circuits_without_delay() {
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();
    let attempted = with_retry(
        &RetryConfig::new().max_attempts(5).base_delay(Duration::from_secs(10)),
        "test",
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(MuninnError::AuthenticationFailed) }
        },
    )
    .await;

    assert!(attempted.result.is_err());
    assert_eq!(attempted.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1); // no retry
    assert_eq!(start.elapsed(), Duration::ZERO); // no backoff slept
}

#[tokio::test(start_paused = true)]
async fn respects_retry_after_hint() {
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();
    let attempted = with_retry(
        &RetryConfig::new()
            .max_attempts(2)
            .base_delay(Duration::from_millis(1))
            .jitter(false),
        "test",
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(MuninnError::RateLimited {
                        retry_after: Some(Duration::from_secs(5)),
                    })
                } else {
                    Ok(())
                }
            }
        },
    )
    .await;

    assert!(attempted.is_ok());
    // waited the provider's 5s hint, not the 1ms base delay
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test]
async fn disabled_config_no_retry() {
    let calls = AtomicU32::new(0);
    let attempted = with_retry(&RetryConfig::disabled(), "test", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(MuninnError::Timeout) }
    })
    .await;

    assert!(attempted.result.is_err());
    assert_eq!(attempted.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
