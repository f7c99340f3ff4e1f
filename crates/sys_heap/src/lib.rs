//! Thin wrappers over the platform C heap.
//!
//! This crate provides the raw `malloc`/`free` style primitives used as the
//! fallback path behind the runtime's free lists. Allocation failure is
//! reported as `None` and is never retried here; policy belongs to the
//! caller.

use std::ptr::NonNull;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as os;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as os;

/// Minimum alignment guaranteed for every block returned by [`sys_alloc`].
///
/// Both the Unix `malloc` and the Windows process heap align to at least
/// two machine words. Callers that pack tag bits into low pointer bits or
/// bucket allocations by 16-byte size classes rely on this.
pub const MIN_ALIGN: usize = if std::mem::size_of::<usize>() == 8 {
    16
} else {
    8
};

/// Allocates `size` bytes from the system heap.
///
/// Returns `None` when the underlying allocator reports exhaustion. A
/// zero-byte request is rounded up to one byte so that every successful
/// call yields a unique, freeable pointer.
#[must_use]
pub fn sys_alloc(size: usize) -> Option<NonNull<u8>> {
    let size = size.max(1);
    os::alloc(size)
}

/// Returns a block obtained from [`sys_alloc`] to the system heap.
///
/// # Safety
///
/// `ptr` must have been returned by [`sys_alloc`] and must not have been
/// freed already.
pub unsafe fn sys_free(ptr: NonNull<u8>) {
    // SAFETY: Forwarded to the caller.
    unsafe { os::free(ptr) }
}
