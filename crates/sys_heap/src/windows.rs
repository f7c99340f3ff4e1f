use std::ptr::NonNull;

#[cfg(not(miri))]
use windows_sys::Win32::System::Memory::{GetProcessHeap, HeapAlloc, HeapFree};

// Miri doesn't support HeapAlloc/HeapFree, so allocations are routed through
// std::alloc with the size stashed in a prefix word ahead of the returned
// block.
#[cfg(miri)]
mod miri_shim {
    use super::NonNull;
    use std::alloc::{alloc, dealloc, Layout};

    const PREFIX: usize = crate::MIN_ALIGN;

    pub fn alloc_prefixed(size: usize) -> Option<NonNull<u8>> {
        let layout = Layout::from_size_align(size + PREFIX, crate::MIN_ALIGN).ok()?;
        // SAFETY: layout has non-zero size.
        let base = unsafe { alloc(layout) };
        let base = NonNull::new(base)?;
        // SAFETY: The first word of the prefix is in-bounds and aligned.
        unsafe {
            base.as_ptr().cast::<usize>().write(size);
            Some(NonNull::new_unchecked(base.as_ptr().add(PREFIX)))
        }
    }

    /// # Safety
    ///
    /// `ptr` must have come from [`alloc_prefixed`].
    pub unsafe fn free_prefixed(ptr: NonNull<u8>) {
        // SAFETY: Guaranteed by the caller; the prefix word holds the
        // original request size.
        unsafe {
            let base = ptr.as_ptr().sub(PREFIX);
            let size = base.cast::<usize>().read();
            let layout = Layout::from_size_align_unchecked(size + PREFIX, crate::MIN_ALIGN);
            dealloc(base, layout);
        }
    }
}

pub fn alloc(size: usize) -> Option<NonNull<u8>> {
    #[cfg(miri)]
    {
        miri_shim::alloc_prefixed(size)
    }
    #[cfg(not(miri))]
    {
        // SAFETY: The process heap handle is valid for the whole process
        // lifetime; HeapAlloc has no other preconditions.
        let ptr = unsafe { HeapAlloc(GetProcessHeap(), 0, size) };
        NonNull::new(ptr.cast::<u8>())
    }
}

/// # Safety
///
/// `ptr` must have come from [`alloc`] and not have been freed.
pub unsafe fn free(ptr: NonNull<u8>) {
    #[cfg(miri)]
    {
        // SAFETY: Guaranteed by the caller.
        unsafe { miri_shim::free_prefixed(ptr) }
    }
    #[cfg(not(miri))]
    {
        // SAFETY: Guaranteed by the caller.
        unsafe {
            HeapFree(GetProcessHeap(), 0, ptr.as_ptr().cast());
        }
    }
}
