//! Request and result types exchanged with the coordinator's collaborators.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// A single analysis request handed in by an evidence collector.
///
/// The payload is opaque to the coordinator; together with the
/// classification tag it forms the cache identity (see
/// [`content_key`](crate::cache::content_key)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Caller-assigned identifier, echoed back on the result.
    pub id: String,
    /// Opaque request payload (typically source file contents).
    pub payload: Vec<u8>,
    /// Classification tag, e.g. the kind of analysis requested.
    pub tag: String,
}

impl AnalysisRequest {
    pub fn new(
        id: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            tag: tag.into(),
        }
    }
}

/// Per-item outcome: the backend's value or a classified failure.
///
/// Modelled as a sum type so every consumer must handle both arms; a failed
/// item is data, not an unwound exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ItemOutcome<V> {
    Success(V),
    Failure { kind: ErrorKind, message: String },
}

impl<V> ItemOutcome<V> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }
}

/// Result of one batch item, produced exactly once per input request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResult<V> {
    /// Identifier copied from the originating [`AnalysisRequest`].
    pub request_id: String,
    pub outcome: ItemOutcome<V>,
    /// Whether the value was served from the response cache. Cached items
    /// never touch the network and report `attempts == 0`.
    pub cached: bool,
    /// Remote attempts made, including the first. Zero for cache hits.
    pub attempts: u32,
    /// Wall time for the full per-item pipeline, limiter wait included.
    pub duration: Duration,
}

impl<V> BatchItemResult<V> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Aggregate counts for a completed batch.
///
/// Derived from the item results, never tracked separately, so
/// `succeeded + failed` always equals the number of completed items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Requests submitted, including any skipped by cancellation.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    /// Wall time for the whole batch.
    pub total_duration: Duration,
    /// Set when the batch was cancelled; skipped items produced no result.
    pub cancelled: bool,
}

impl BatchSummary {
    /// Recompute the summary from item results.
    pub fn from_results<V>(
        total: usize,
        results: &[BatchItemResult<V>],
        total_duration: Duration,
        cancelled: bool,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let cache_hits = results.iter().filter(|r| r.cached).count();
        Self {
            total,
            succeeded,
            failed: results.len() - succeeded,
            cache_hits,
            total_duration,
            cancelled,
        }
    }

    /// Items that actually ran (for a cancelled batch, less than `total`).
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Everything a batch produces: the summary plus every item result.
///
/// Completion order of `results` is unspecified; sort by `request_id` when a
/// stable order is needed.
#[derive(Debug, Clone)]
pub struct BatchReport<V> {
    pub summary: BatchSummary,
    pub results: Vec<BatchItemResult<V>>,
}
