use std::ptr::NonNull;

pub fn alloc(size: usize) -> Option<NonNull<u8>> {
    // SAFETY: malloc with a non-zero size has no preconditions.
    let ptr = unsafe { libc::malloc(size) };
    NonNull::new(ptr.cast::<u8>())
}

/// # Safety
///
/// `ptr` must have come from [`alloc`] and not have been freed.
pub unsafe fn free(ptr: NonNull<u8>) {
    // SAFETY: Guaranteed by the caller.
    unsafe { libc::free(ptr.as_ptr().cast::<libc::c_void>()) }
}
