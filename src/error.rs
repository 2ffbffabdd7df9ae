//! Domain errors surfaced by the store engine.

use thiserror::Error;

/// Everything that can go wrong inside a store operation.
///
/// Callers can use [`StoreError::is_retryable`] to distinguish transient
/// failures (worth retrying as-is) from errors that will keep failing until
/// the caller changes something.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product id names no slot in the store.
    #[error("product not found: {0}")]
    NotFound(String),

    /// Evolution was requested but no slot satisfies the eligibility
    /// condition under the configured policy.
    #[error("no product is eligible to evolve yet")]
    NoEligibleWinner,

    /// Too soon since the last evolution. `remaining_secs` is how long the
    /// caller has to wait (or pass `force`).
    #[error("evolution debounced, {remaining_secs}s remaining in the window")]
    Debounced { remaining_secs: i64 },

    /// Another evolution is executing right now.
    #[error("an evolution is already in progress")]
    EvolutionInProgress,

    /// The generator timed out, errored, or returned malformed output.
    /// The store is left unchanged.
    #[error("evolution generation failed: {0}")]
    GenerationFailed(String),

    /// The persistence adapter could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    /// Whether an identical retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::GenerationFailed(_) | StoreError::StorageUnavailable(_)
        )
    }
}
