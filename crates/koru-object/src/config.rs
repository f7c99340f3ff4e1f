//! Free-list capacity configuration.

/// Retained-count caps for every free list in a registry.
///
/// The defaults are inherited from the original runtime's empirical
/// workload profile. They are tuning parameters, not part of the
/// correctness contract: any configuration that keeps a cap finite
/// preserves every allocator invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeListConfig {
    /// Cap per generic size-class list.
    pub by_size: u32,
    /// Boxed floats.
    pub floats: u32,
    /// Boxed small integers.
    pub ints: u32,
    /// Fixed-length sequences, per cached length.
    pub seqs: u32,
    /// Sequence iterators.
    pub seq_iters: u32,
    /// Growable vectors.
    pub vectors: u32,
    /// Vector iterators.
    pub vector_iters: u32,
    /// Mapping objects.
    pub maps: u32,
    /// Mapping key tables.
    pub map_keys: u32,
    /// Slice objects.
    pub slices: u32,
    /// Range objects.
    pub ranges: u32,
    /// Range iterators.
    pub range_iters: u32,
    /// Execution context snapshots.
    pub contexts: u32,
    /// Interpreter stack chunks.
    pub stack_chunks: u32,
    /// Bound method objects.
    pub bound_methods: u32,
}

impl FreeListConfig {
    /// Configuration with every cap at zero: nothing is ever retained and
    /// every release goes straight to the backing heap.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            by_size: 0,
            floats: 0,
            ints: 0,
            seqs: 0,
            seq_iters: 0,
            vectors: 0,
            vector_iters: 0,
            maps: 0,
            map_keys: 0,
            slices: 0,
            ranges: 0,
            range_iters: 0,
            contexts: 0,
            stack_chunks: 0,
            bound_methods: 0,
        }
    }
}

impl Default for FreeListConfig {
    fn default() -> Self {
        Self {
            by_size: 100,
            floats: 100,
            ints: 100,
            seqs: 2000,
            seq_iters: 10,
            vectors: 80,
            vector_iters: 10,
            maps: 80,
            map_keys: 80,
            slices: 1,
            ranges: 6,
            range_iters: 6,
            contexts: 255,
            stack_chunks: 4,
            bound_methods: 20,
        }
    }
}
