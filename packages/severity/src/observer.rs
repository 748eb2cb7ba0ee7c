//! Hook for comparing trained and rule-based scores.

use std::sync::Arc;

/// Receives both scores whenever the trained predictor produced the result.
///
/// Implementations must be `Send + Sync` because engines are shared across
/// threads.
pub trait DivergenceObserver: Send + Sync {
    /// Called once per trained-path computation.
    fn observe(&self, trained_score: u8, rule_based_score: u8);
}

/// Ignores every observation.
pub struct NullObserver;

impl DivergenceObserver for NullObserver {
    fn observe(&self, _trained_score: u8, _rule_based_score: u8) {}
}

/// Returns a shared [`NullObserver`].
#[must_use]
pub fn null_observer() -> Arc<dyn DivergenceObserver> {
    Arc::new(NullObserver)
}
