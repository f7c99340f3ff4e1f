//! Execution contexts and runtime glue.
//!
//! A [`FreeListRegistry`] is always owned by exactly one [`ExecContext`]
//! and reached through it explicitly — never through ambient global state.
//! Under the single-lock regime one context serves the whole runtime
//! behind the runtime lock; under the free-threaded regime every thread
//! owns its own.

#[cfg(not(feature = "free-threaded"))]
use std::mem;

#[cfg(not(feature = "free-threaded"))]
use parking_lot::{Mutex, MutexGuard};

use crate::config::FreeListConfig;
use crate::freelist::FreeListRegistry;
use crate::heap::{system_heap, BackingHeap};
#[cfg(feature = "free-threaded")]
use crate::partition::PartitionHandles;
use crate::stats::{AllocStats, RuntimeStats};
use crate::tracing::internal;

// ============================================================================
// ExecContext
// ============================================================================

/// One execution context: a free-list registry, a backing heap handle, and
/// per-context counters.
///
/// Created at context start and drained via [`clear_all`](Self::clear_all)
/// at context exit; dropping a context drains it as a final teardown.
pub struct ExecContext {
    pub(crate) freelists: FreeListRegistry,
    /// This thread's arena handle per heap partition.
    #[cfg(feature = "free-threaded")]
    pub(crate) partitions: PartitionHandles,
    pub(crate) heap: &'static dyn BackingHeap,
    pub(crate) stats: AllocStats,
}

impl ExecContext {
    /// Creates a context over the system heap.
    #[must_use]
    pub fn new(config: &FreeListConfig) -> Self {
        Self::with_heap(config, system_heap())
    }

    /// Creates a context over a caller-supplied backing heap.
    #[must_use]
    pub fn with_heap(config: &FreeListConfig, heap: &'static dyn BackingHeap) -> Self {
        internal::context_created();
        Self {
            freelists: FreeListRegistry::new(config),
            #[cfg(feature = "free-threaded")]
            partitions: PartitionHandles::new_for_thread(),
            heap,
            stats: AllocStats::new(),
        }
    }

    /// Read access to the context's free lists.
    #[must_use]
    pub fn freelists(&self) -> &FreeListRegistry {
        &self.freelists
    }

    /// This thread's partition handles.
    #[cfg(feature = "free-threaded")]
    #[must_use]
    pub fn partitions(&self) -> &PartitionHandles {
        &self.partitions
    }

    /// A copy of the context's counters.
    #[must_use]
    pub fn stats(&self) -> AllocStats {
        self.stats
    }

    /// Returns every retained slot to the backing heap and resets every
    /// list to `available == capacity`.
    ///
    /// Idempotent: clearing an already-empty registry is a no-op. This is
    /// the only way a list is drained outside normal pop traffic. With
    /// `is_final` set, retention is also disabled so that later releases
    /// fall straight through to the backing heap.
    pub fn clear_all(&mut self, is_final: bool) {
        let heap = self.heap;
        let stats = &mut self.stats;
        let mut drained: u64 = 0;
        for list in self.freelists.all_lists_mut() {
            while let Some(slot) = list.pop() {
                stats.frees += 1;
                drained += 1;
                // SAFETY: Every retained slot originated from the backing
                // heap and is exclusively owned by the list it was popped
                // from.
                unsafe { heap.release(slot) };
            }
            if is_final {
                list.disable();
            }
        }
        internal::freelists_cleared(drained, is_final);
    }
}

impl Drop for ExecContext {
    fn drop(&mut self) {
        self.clear_all(true);
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// Single-lock runtime: one context behind the global lock.
///
/// The lock is the regime's defining property — all interpreter activity
/// serializes on it, which is why free-list operations and reference
/// counts need no atomics here.
#[cfg(not(feature = "free-threaded"))]
pub struct Runtime {
    context: Mutex<ExecContext>,
    stats: RuntimeStats,
}

#[cfg(not(feature = "free-threaded"))]
impl Runtime {
    /// Creates a runtime over the system heap.
    #[must_use]
    pub fn new(config: &FreeListConfig) -> Self {
        Self::with_heap(config, system_heap())
    }

    /// Creates a runtime over a caller-supplied backing heap.
    #[must_use]
    pub fn with_heap(config: &FreeListConfig, heap: &'static dyn BackingHeap) -> Self {
        Self {
            context: Mutex::new(ExecContext::with_heap(config, heap)),
            stats: RuntimeStats::new(),
        }
    }

    /// Acquires the runtime lock and returns the context.
    pub fn lock(&self) -> MutexGuard<'_, ExecContext> {
        self.context.lock()
    }

    /// Final teardown: drains the context and folds its counters into the
    /// process totals.
    pub fn shutdown(&self) {
        let mut context = self.context.lock();
        context.clear_all(true);
        let stats = mem::take(&mut context.stats);
        internal::context_retired(&stats);
        self.stats.accumulate(stats);
    }

    /// Process totals plus the live context's counters.
    #[must_use]
    pub fn stats(&self) -> AllocStats {
        let live = self.context.lock().stats;
        let totals = self.stats.snapshot();
        AllocStats {
            served_from_freelist: totals.served_from_freelist + live.served_from_freelist,
            fallback_allocations: totals.fallback_allocations + live.fallback_allocations,
            frees: totals.frees + live.frees,
        }
    }
}

/// Free-threaded runtime: a factory for per-thread contexts plus merged
/// process totals.
///
/// There is no global lock; each thread allocates through its own context
/// and reports its counters when the context retires.
#[cfg(feature = "free-threaded")]
pub struct Runtime {
    config: FreeListConfig,
    heap: &'static dyn BackingHeap,
    stats: RuntimeStats,
}

#[cfg(feature = "free-threaded")]
impl Runtime {
    /// Creates a runtime over the system heap.
    #[must_use]
    pub fn new(config: &FreeListConfig) -> Self {
        Self::with_heap(config, system_heap())
    }

    /// Creates a runtime over a caller-supplied backing heap.
    #[must_use]
    pub fn with_heap(config: &FreeListConfig, heap: &'static dyn BackingHeap) -> Self {
        Self {
            config: *config,
            heap,
            stats: RuntimeStats::new(),
        }
    }

    /// Creates a context for the calling thread, with its own registry and
    /// partition handles.
    #[must_use]
    pub fn create_context(&self) -> ExecContext {
        ExecContext::with_heap(&self.config, self.heap)
    }

    /// Retires a thread's context: drains its lists and folds its counters
    /// into the process totals. `is_final` marks interpreter teardown
    /// rather than ordinary thread exit.
    pub fn retire_context(&self, mut context: ExecContext, is_final: bool) {
        context.clear_all(is_final);
        let stats = std::mem::take(&mut context.stats);
        internal::context_retired(&stats);
        self.stats.accumulate(stats);
    }

    /// Process totals from retired contexts.
    #[must_use]
    pub fn stats(&self) -> AllocStats {
        self.stats.snapshot()
    }
}
