//! Allocation statistics.
//!
//! Counting is observational only: the counters never influence control
//! flow and no collaborator has to read them. Per-context counters are
//! plain integers bumped on the owning context's thread; process-wide
//! totals are atomics merged when a context retires.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::utils::CachePadded;

/// Per-operation counters owned by one execution context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Requests served by popping a free list.
    pub served_from_freelist: u64,
    /// Requests that fell through to the backing heap.
    pub fallback_allocations: u64,
    /// Blocks returned to the backing heap.
    pub frees: u64,
}

impl AllocStats {
    /// All counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            served_from_freelist: 0,
            fallback_allocations: 0,
            frees: 0,
        }
    }
}

/// Process-wide allocation totals.
///
/// Fields are cache-padded: under the free-threaded regime several threads
/// retire contexts and report fallback traffic concurrently, and the
/// counters must not share lines.
#[derive(Debug, Default)]
pub struct RuntimeStats {
    served_from_freelist: CachePadded<AtomicU64>,
    fallback_allocations: CachePadded<AtomicU64>,
    frees: CachePadded<AtomicU64>,
}

impl RuntimeStats {
    /// All totals at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one context's counters into the totals.
    pub fn accumulate(&self, stats: AllocStats) {
        self.served_from_freelist
            .fetch_add(stats.served_from_freelist, Ordering::Relaxed);
        self.fallback_allocations
            .fetch_add(stats.fallback_allocations, Ordering::Relaxed);
        self.frees.fetch_add(stats.frees, Ordering::Relaxed);
    }

    /// A point-in-time copy of the totals.
    #[must_use]
    pub fn snapshot(&self) -> AllocStats {
        AllocStats {
            served_from_freelist: self.served_from_freelist.load(Ordering::Relaxed),
            fallback_allocations: self.fallback_allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
        }
    }
}
