//! The backing heap seam.
//!
//! Free lists sit in front of a backing allocator: every miss, every push
//! onto a full list, and every large request falls through to it. The seam
//! is a trait so embedders (and tests) can substitute their own arena
//! implementation; [`SystemHeap`] over the platform C heap is the default.

use std::ptr::NonNull;

use crate::error::AllocError;
#[cfg(feature = "free-threaded")]
use crate::partition::ArenaHandle;

/// A raw allocator behind the free lists.
///
/// Failures propagate verbatim to the requesting caller — implementations
/// must not retry internally, and callers never mask an error with a
/// degraded path.
pub trait BackingHeap: Sync {
    /// Allocates `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when the heap is exhausted.
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError>;

    /// Returns a block obtained from this heap.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this heap and not freed already.
    unsafe fn release(&self, ptr: NonNull<u8>);

    /// Allocates `size` bytes from the arena behind `arena`.
    ///
    /// Arena handles come from a thread's
    /// [`PartitionHandles`](crate::PartitionHandles); any cross-thread
    /// synchronization of arena metadata is the implementation's own
    /// concern. The default ignores the handle.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when the arena is exhausted.
    #[cfg(feature = "free-threaded")]
    fn allocate_in(&self, arena: ArenaHandle, size: usize) -> Result<NonNull<u8>, AllocError> {
        let _ = arena;
        self.allocate(size)
    }
}

/// The platform C heap as a [`BackingHeap`].
///
/// Partition handles are accepted but degenerate: the C heap cannot
/// segregate arenas, so every handle maps to the same underlying heap.
#[derive(Debug, Default)]
pub struct SystemHeap {
    _priv: (),
}

impl SystemHeap {
    /// Creates a system heap handle.
    #[must_use]
    pub const fn new() -> Self {
        Self { _priv: () }
    }
}

impl BackingHeap for SystemHeap {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        sys_heap::sys_alloc(size).ok_or(AllocError { size })
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        // SAFETY: Forwarded to the caller.
        unsafe { sys_heap::sys_free(ptr) }
    }
}

/// The process-wide default [`SystemHeap`].
#[must_use]
pub fn system_heap() -> &'static SystemHeap {
    static SYSTEM: SystemHeap = SystemHeap::new();
    &SYSTEM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_heap_round_trip() {
        let heap = system_heap();
        let ptr = heap.allocate(64).expect("system heap allocation failed");
        unsafe {
            ptr.as_ptr().write(0xA5);
            heap.release(ptr);
        }
    }
}
