//! Allocation event tracing.
//!
//! When the `tracing` feature is enabled, this module emits structured
//! events for context lifecycle and fallback traffic. Tracing is
//! fire-and-forget: it never influences control flow, and the stub module
//! below makes its absence free.

#[cfg(feature = "tracing")]
pub(crate) mod internal {
    use crate::stats::AllocStats;

    pub(crate) fn context_created() {
        tracing::debug!("exec_context_created");
    }

    pub(crate) fn context_retired(stats: &AllocStats) {
        tracing::debug!(
            served_from_freelist = stats.served_from_freelist,
            fallback_allocations = stats.fallback_allocations,
            frees = stats.frees,
            "exec_context_retired"
        );
    }

    pub(crate) fn freelists_cleared(drained: u64, is_final: bool) {
        tracing::debug!(drained, is_final, "freelists_cleared");
    }

    pub(crate) fn fallback_allocation(size: usize) {
        tracing::trace!(size, "fallback_allocation");
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) mod internal {
    use crate::stats::AllocStats;

    #[inline]
    pub(crate) const fn context_created() {}

    #[inline]
    pub(crate) const fn context_retired(_stats: &AllocStats) {}

    #[inline]
    pub(crate) const fn freelists_cleared(_drained: u64, _is_final: bool) {}

    #[inline]
    pub(crate) const fn fallback_allocation(_size: usize) {}
}
