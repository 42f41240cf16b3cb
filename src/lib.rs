//! Muninn - admission control, caching, and batching for metered remote
//! analysis calls
//!
//! This crate sits in front of a slow, metered, unreliable remote analysis
//! service and turns an unbounded stream of per-file requests into a safe,
//! efficient, fault-tolerant sequence of remote calls:
//!
//! - [`RateLimiter`] — rolling-window call ceiling plus an in-flight cap,
//!   with RAII permits so a slot can never leak.
//! - [`ResponseCache`] — content-addressed deduplication with TTL and
//!   insertion-order eviction.
//! - [`RetryConfig`] / [`with_retry`] — transient-vs-terminal failure
//!   classification and exponential backoff with jitter.
//! - [`BatchCoordinator`] — a bounded worker pool composing the above, with
//!   per-item failure isolation and cooperative cancellation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use muninn::{AnalysisBackend, AnalysisRequest, BatchCoordinator, Result};
//!
//! struct Remote;
//!
//! #[async_trait::async_trait]
//! impl AnalysisBackend for Remote {
//!     type Output = String;
//!
//!     fn name(&self) -> &str {
//!         "remote"
//!     }
//!
//!     async fn analyze(&self, payload: &[u8], tag: &str) -> Result<String> {
//!         // transport, auth, and schema live outside this crate
//!         Ok(format!("{tag}: {} bytes analyzed", payload.len()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = BatchCoordinator::builder(Arc::new(Remote)).build();
//!     let report = coordinator
//!         .run_batch(
//!             vec![AnalysisRequest::new("src/main.rs", b"fn main() {}".to_vec(), "lint")],
//!             4,
//!         )
//!         .await;
//!     println!("{}/{} succeeded", report.summary.succeeded, report.summary.total);
//! }
//! ```

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod limiter;
pub mod retry;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache, content_key};
pub use coordinator::{BatchCoordinator, CancelToken, CoordinatorBuilder};
pub use error::{ErrorKind, MuninnError, Result};
pub use limiter::{LimiterConfig, LimiterPermit, RateLimiter};
pub use retry::{Attempted, RetryConfig, with_retry};
pub use traits::AnalysisBackend;
pub use types::{AnalysisRequest, BatchItemResult, BatchReport, BatchSummary, ItemOutcome};
