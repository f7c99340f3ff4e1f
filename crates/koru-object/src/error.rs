//! Allocation error types.

use thiserror::Error;

/// Failure reported by the backing heap.
///
/// Out-of-memory is a distinguishable outcome returned to the caller. It is
/// never retried and never masked by a degraded allocation path; recovery
/// policy belongs to the embedding runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("allocation of {size} bytes failed")]
pub struct AllocError {
    /// Size of the failed request in bytes.
    pub size: usize,
}
