//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `backend` — backend name from [`AnalysisBackend::name()`](crate::AnalysisBackend::name)
//! - `operation` — logical operation being retried (e.g. "analyze")
//! - `status` — outcome: "ok" or "error"

/// Total remote requests dispatched by the coordinator (cache hits excluded).
///
/// Labels: `backend`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "muninn_requests_total";

/// Per-item pipeline duration in seconds, including limiter wait and retries.
///
/// Labels: `backend`.
pub const REQUEST_DURATION_SECONDS: &str = "muninn_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "muninn_retries_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total response cache misses (includes lazily expired entries).
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total entries removed from the cache, by capacity or expiry.
pub const CACHE_EVICTIONS_TOTAL: &str = "muninn_cache_evictions_total";

/// Time spent waiting for rate-limiter admission, in seconds.
pub const LIMITER_WAIT_SECONDS: &str = "muninn_limiter_wait_seconds";
