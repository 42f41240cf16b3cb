//! Core AnalysisBackend trait

use async_trait::async_trait;

use crate::Result;

/// The remote analysis provider, injected by the surrounding system.
///
/// The coordinator has no knowledge of the provider's transport, auth, or
/// response schema — it sees a single opaque call from (payload, tag) to a
/// cloneable output value. Implementations map their own failure modes onto
/// [`MuninnError`](crate::MuninnError) so that retry classification works.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Opaque successful result type. Cloned on cache hits.
    type Output: Clone + Send + Sync + 'static;

    /// Human-readable backend name, used in logs and metric labels.
    fn name(&self) -> &str;

    /// Perform one remote analysis call.
    ///
    /// Called once per attempt; the retry driver re-invokes it on transient
    /// failures. Implementations should not retry internally.
    async fn analyze(&self, payload: &[u8], tag: &str) -> Result<Self::Output>;
}
