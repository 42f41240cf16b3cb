//! Batch orchestration: cache → rate limit → retry → remote call.
//!
//! [`BatchCoordinator`] is the only component that talks to all the others.
//! For each request it checks the [`ResponseCache`], acquires a
//! [`RateLimiter`] permit, drives the injected [`AnalysisBackend`] through
//! [`with_retry`], writes successes back to the cache, and records one
//! [`BatchItemResult`] — all per item, so a failure never aborts siblings.
//!
//! Concurrency is a fixed pool of workers draining a shared queue. Each
//! worker runs the full pipeline sequentially for its own items; workers run
//! in parallel with each other, bounded by the batch's worker count and,
//! globally, by the shared limiter's own ceiling.

mod builder;
mod cancel;

pub use builder::CoordinatorBuilder;
pub use cancel::CancelToken;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::cache::{ResponseCache, content_key};
use crate::error::MuninnError;
use crate::limiter::RateLimiter;
use crate::retry::{RetryConfig, with_retry};
use crate::telemetry;
use crate::traits::AnalysisBackend;
use crate::types::{AnalysisRequest, BatchItemResult, BatchReport, BatchSummary, ItemOutcome};

/// Result-channel buffer for [`BatchCoordinator::stream_batch`].
///
/// Bounded so a slow consumer applies backpressure to the workers instead of
/// letting finished results pile up without limit.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

struct Inner<B: AnalysisBackend> {
    backend: Arc<B>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache<B::Output>>,
    retry: RetryConfig,
    call_timeout: Duration,
}

/// Orchestrates batches of analysis requests against one remote backend.
///
/// Cheap to clone; clones share the same backend, limiter, and cache
/// handles. Construct via [`BatchCoordinator::builder`].
pub struct BatchCoordinator<B: AnalysisBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: AnalysisBackend> Clone for BatchCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: AnalysisBackend + 'static> BatchCoordinator<B> {
    /// Start configuring a coordinator around the given backend.
    pub fn builder(backend: Arc<B>) -> CoordinatorBuilder<B> {
        CoordinatorBuilder::new(backend)
    }

    /// Run every request to completion and aggregate a summary.
    ///
    /// `workers` is the batch-local pool size (clamped to at least 1); the
    /// shared limiter still applies its own global in-flight ceiling on top,
    /// so a worker count above it buys nothing. Item completion order is
    /// unspecified — sort by `request_id` if a stable order is needed.
    pub async fn run_batch(
        &self,
        requests: Vec<AnalysisRequest>,
        workers: usize,
    ) -> BatchReport<B::Output> {
        self.run_batch_with_cancel(requests, workers, CancelToken::new())
            .await
    }

    /// Like [`run_batch`](Self::run_batch), with a cancellation token.
    ///
    /// Once the token is raised, no further items are dequeued; in-flight
    /// items finish normally. The summary counts only completed items and
    /// carries `cancelled = true`.
    pub async fn run_batch_with_cancel(
        &self,
        requests: Vec<AnalysisRequest>,
        workers: usize,
        cancel: CancelToken,
    ) -> BatchReport<B::Output> {
        let started = tokio::time::Instant::now();
        let total = requests.len();
        let workers = workers.max(1).min(total.max(1));

        let (tx, mut rx) = mpsc::channel(workers);
        let handles = self.spawn_workers(requests, workers, cancel.clone(), tx);

        let mut results = Vec::with_capacity(total);
        while let Some(item) = rx.recv().await {
            results.push(item);
        }
        for handle in handles {
            if handle.await.is_err() {
                // A worker panic is a programming error, not an item failure.
                warn!("batch worker panicked");
            }
        }

        let summary =
            BatchSummary::from_results(total, &results, started.elapsed(), cancel.is_cancelled());
        debug!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cache_hits = summary.cache_hits,
            cancelled = summary.cancelled,
            "batch complete"
        );
        BatchReport { summary, results }
    }

    /// Stream item results as they complete.
    ///
    /// Results flow through a bounded channel ([`DEFAULT_STREAM_BUFFER`]), so
    /// a consumer that falls behind blocks the workers rather than buffering
    /// without limit. Dropping the stream stops the workers after their
    /// current item. No summary is produced; use
    /// [`run_batch`](Self::run_batch) when aggregate counts are needed.
    pub fn stream_batch(
        &self,
        requests: Vec<AnalysisRequest>,
        workers: usize,
    ) -> impl Stream<Item = BatchItemResult<B::Output>> + Send + use<B> {
        let total = requests.len();
        let workers = workers.max(1).min(total.max(1));
        let (tx, rx) = mpsc::channel(DEFAULT_STREAM_BUFFER);
        self.spawn_workers(requests, workers, CancelToken::new(), tx);
        ReceiverStream::new(rx)
    }

    fn spawn_workers(
        &self,
        requests: Vec<AnalysisRequest>,
        workers: usize,
        cancel: CancelToken,
        tx: mpsc::Sender<BatchItemResult<B::Output>>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let queue = Arc::new(Mutex::new(VecDeque::from(requests)));
        (0..workers)
            .map(|_| {
                let this = self.clone();
                let queue = Arc::clone(&queue);
                let cancel = cancel.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let request = queue.lock().unwrap().pop_front();
                        let Some(request) = request else { break };
                        let result = this.process_one(request).await;
                        if tx.send(result).await.is_err() {
                            break; // receiver dropped
                        }
                    }
                })
            })
            .collect()
    }

    /// The full per-item pipeline. Infallible by construction: every error
    /// is captured in the returned result's outcome.
    async fn process_one(&self, request: AnalysisRequest) -> BatchItemResult<B::Output> {
        let started = tokio::time::Instant::now();
        let key = content_key(&request.tag, &request.payload);

        if let Some(value) = self.inner.cache.lookup(key) {
            debug!(request_id = %request.id, tag = %request.tag, "cache hit, skipping remote call");
            return BatchItemResult {
                request_id: request.id,
                outcome: ItemOutcome::Success(value),
                cached: true,
                attempts: 0,
                duration: started.elapsed(),
            };
        }

        // The permit spans all attempts of this logical call and is released
        // on drop, whatever the outcome.
        let permit = self.inner.limiter.acquire().await;
        let attempted = with_retry(&self.inner.retry, "analyze", || self.call_once(&request)).await;
        drop(permit);

        let outcome = match attempted.result {
            Ok(value) => {
                self.inner.cache.store(key, value.clone());
                ItemOutcome::Success(value)
            }
            Err(e) => {
                warn!(
                    request_id = %request.id,
                    tag = %request.tag,
                    kind = %e.kind(),
                    attempts = attempted.attempts,
                    error = %e,
                    "analysis failed"
                );
                ItemOutcome::Failure {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        let status = if outcome.is_success() { "ok" } else { "error" };
        let backend = self.inner.backend.name().to_owned();
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "backend" => backend.clone(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "backend" => backend)
            .record(started.elapsed().as_secs_f64());

        BatchItemResult {
            request_id: request.id,
            outcome,
            cached: false,
            attempts: attempted.attempts,
            duration: started.elapsed(),
        }
    }

    /// One remote attempt, bounded by the per-call timeout. An elapsed
    /// timeout is transient: the provider may simply have been slow.
    async fn call_once(&self, request: &AnalysisRequest) -> crate::Result<B::Output> {
        match tokio::time::timeout(
            self.inner.call_timeout,
            self.inner.backend.analyze(&request.payload, &request.tag),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MuninnError::Timeout),
        }
    }
}
