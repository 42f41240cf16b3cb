//! Builder for configuring coordinator instances.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheConfig, ResponseCache};
use crate::limiter::{LimiterConfig, RateLimiter};
use crate::retry::RetryConfig;
use crate::traits::AnalysisBackend;

use super::{BatchCoordinator, Inner};

/// Default per-call timeout, distinct from the retry backoff.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Builder for configuring coordinator instances.
///
/// The limiter and cache can be passed in as shared `Arc` handles so several
/// coordinators (or several batches) honour one global ceiling and one
/// deduplication store; when omitted, private instances with default configs
/// are created.
///
/// ```rust
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # use muninn::{AnalysisBackend, BatchCoordinator, LimiterConfig, RateLimiter, RetryConfig, Result};
/// # struct Remote;
/// # #[async_trait::async_trait]
/// # impl AnalysisBackend for Remote {
/// #     type Output = String;
/// #     fn name(&self) -> &str { "remote" }
/// #     async fn analyze(&self, _payload: &[u8], _tag: &str) -> Result<String> { Ok("ok".into()) }
/// # }
/// let limiter = Arc::new(RateLimiter::new(LimiterConfig::new().max_concurrency(4)));
/// let coordinator = BatchCoordinator::builder(Arc::new(Remote))
///     .limiter(limiter)
///     .retry(RetryConfig::new().max_attempts(5))
///     .call_timeout(Duration::from_secs(30))
///     .build();
/// ```
pub struct CoordinatorBuilder<B: AnalysisBackend> {
    backend: Arc<B>,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<Arc<ResponseCache<B::Output>>>,
    retry: RetryConfig,
    call_timeout: Duration,
}

impl<B: AnalysisBackend> CoordinatorBuilder<B> {
    pub(super) fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            limiter: None,
            cache: None,
            retry: RetryConfig::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Use a shared rate limiter instance.
    pub fn limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Use a shared response cache instance.
    pub fn cache(mut self, cache: Arc<ResponseCache<B::Output>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the retry policy for remote calls.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Set the timeout for a single remote attempt.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Build the coordinator, creating default limiter/cache instances for
    /// anything not supplied.
    pub fn build(self) -> BatchCoordinator<B> {
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::new(LimiterConfig::default())));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResponseCache::new(CacheConfig::default())));
        BatchCoordinator {
            inner: Arc::new(Inner {
                backend: self.backend,
                limiter,
                cache,
                retry: self.retry,
                call_timeout: self.call_timeout,
            }),
        }
    }
}
