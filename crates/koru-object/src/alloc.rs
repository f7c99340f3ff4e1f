//! Size-class allocation and object materialization.
//!
//! These are the operations the interpreter loop calls to turn raw memory
//! into objects and back. Small requests are bucketed into 16-byte size
//! classes and served from the owning context's free lists; everything
//! else — and every miss — falls through to the backing heap, whose
//! failures propagate verbatim.

use std::ptr::{self, NonNull};

use crate::context::ExecContext;
use crate::error::AllocError;
use crate::freelist::{size_class_index, CachedKind, SMALL_REQUEST_THRESHOLD};
use crate::object::ObjectHeader;
#[cfg(feature = "free-threaded")]
use crate::partition::HeapPartition;
use crate::tracing::internal;
use crate::typedesc::TypeDescriptor;

/// Bytes reserved ahead of the header for kinds with a prefix header.
///
/// The prefix belongs to the cycle collector (two link words); it is
/// zeroed on allocation and otherwise opaque to this crate.
pub const PREFIX_HEADER_SIZE: usize = 2 * std::mem::size_of::<usize>();

impl ExecContext {
    /// Acquires `size` bytes of raw memory.
    ///
    /// Requests within the small-object threshold probe the matching
    /// size-class list first; a hit transfers the slot to the caller.
    /// Misses and large requests go to the backing heap.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when the backing heap is exhausted. The error
    /// is never retried here and must not be masked by the caller.
    pub fn acquire(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(size > 0, "zero-size acquire");
        if size <= SMALL_REQUEST_THRESHOLD {
            if let Some(slot) = self.freelists.by_size_mut(size_class_index(size)).pop() {
                self.stats.served_from_freelist += 1;
                return Ok(slot);
            }
        }
        self.fallback_allocate(size)
    }

    /// Releases a block acquired with `size` bytes.
    ///
    /// Small blocks are offered to the matching size-class list; when the
    /// list is full (not an error) or the block is large, it goes back to
    /// the backing heap.
    ///
    /// # Safety
    ///
    /// `ptr` must be a block of `size` bytes obtained from [`acquire`]
    /// (or [`new_object`]) on a context sharing this backing heap, with no
    /// live object interpretation remaining; ownership transfers here.
    ///
    /// [`acquire`]: Self::acquire
    /// [`new_object`]: Self::new_object
    pub unsafe fn release(&mut self, ptr: NonNull<u8>, size: usize) {
        debug_assert!(size > 0, "zero-size release");
        if size <= SMALL_REQUEST_THRESHOLD {
            let index = size_class_index(size);
            // SAFETY: The block is dead and exclusively the caller's, per
            // this function's contract.
            if unsafe { self.freelists.by_size_mut(index).push(ptr) } {
                return;
            }
        }
        self.stats.frees += 1;
        // SAFETY: The block originated from the backing heap.
        unsafe { self.heap.release(ptr) };
    }

    /// Pops a slot from a dedicated kind list.
    ///
    /// Returns `None` on an empty list or an uncacheable kind; the caller
    /// then allocates through [`acquire`](Self::acquire) as usual.
    pub fn acquire_kind(&mut self, kind: CachedKind) -> Option<NonNull<u8>> {
        let slot = self.freelists.list_mut(kind)?.pop()?;
        self.stats.served_from_freelist += 1;
        Some(slot)
    }

    /// Offers a block to a dedicated kind list, freeing it through the
    /// backing heap when the list is full or the kind is uncacheable.
    ///
    /// # Safety
    ///
    /// Same contract as [`release`](Self::release): `ptr` must be a dead
    /// block owned by the caller, and ownership transfers here.
    pub unsafe fn release_kind(&mut self, kind: CachedKind, ptr: NonNull<u8>) {
        if let Some(list) = self.freelists.list_mut(kind) {
            // SAFETY: Forwarded from this function's contract.
            if unsafe { list.push(ptr) } {
                return;
            }
        }
        self.stats.frees += 1;
        // SAFETY: The block originated from the backing heap.
        unsafe { self.heap.release(ptr) };
    }

    /// Allocates and initializes an object of the described kind.
    ///
    /// The header is written with a count of one; kinds with a prefix
    /// header get `PREFIX_HEADER_SIZE` zeroed bytes ahead of it. Kinds
    /// eligible for small slots reuse the size-class lists; under the
    /// free-threaded regime the fallback allocation is routed to the
    /// thread's arena for the kind's heap partition.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when the backing heap is exhausted.
    pub fn new_object(
        &mut self,
        desc: &'static TypeDescriptor,
    ) -> Result<NonNull<ObjectHeader>, AllocError> {
        let presize = if desc.has_prefix_header {
            PREFIX_HEADER_SIZE
        } else {
            0
        };
        let total = desc.basic_size + presize;
        debug_assert!(
            desc.basic_size >= std::mem::size_of::<ObjectHeader>(),
            "instance size smaller than the object header"
        );
        if desc.eligible_for_small_slot && total <= SMALL_REQUEST_THRESHOLD {
            if let Some(block) = self.freelists.by_size_mut(size_class_index(total)).pop() {
                self.stats.served_from_freelist += 1;
                // SAFETY: The slot's class fits `total` bytes.
                return Ok(unsafe { init_object(block, desc, presize) });
            }
        }
        let block = self.object_allocate(desc, total)?;
        // SAFETY: The block was just allocated with `total` bytes.
        Ok(unsafe { init_object(block, desc, presize) })
    }

    /// Returns an object's memory to the allocator.
    ///
    /// The inverse of [`new_object`](Self::new_object): small-slot-eligible
    /// kinds are offered to the size-class lists, everything else goes back
    /// to the backing heap. Typically called from a descriptor's `drop_fn`.
    ///
    /// # Safety
    ///
    /// `obj` must have been produced by [`new_object`](Self::new_object) on
    /// a context sharing this backing heap, its count must not be observable
    /// by any other reference, and it must not be used afterwards.
    pub unsafe fn free_object(&mut self, obj: NonNull<ObjectHeader>) {
        // SAFETY: `obj` is live per this function's contract.
        let header = unsafe { obj.as_ref() };
        debug_assert!(!header.is_immortal(), "freeing an immortal object");
        let desc = header.type_desc();
        let presize = if desc.has_prefix_header {
            PREFIX_HEADER_SIZE
        } else {
            0
        };
        let total = desc.basic_size + presize;
        // SAFETY: `new_object` placed the header `presize` bytes into the
        // block.
        let block = unsafe { NonNull::new_unchecked(obj.as_ptr().cast::<u8>().sub(presize)) };
        if desc.eligible_for_small_slot && total <= SMALL_REQUEST_THRESHOLD {
            let index = size_class_index(total);
            // SAFETY: The object interpretation ends here; the block is
            // exclusively ours.
            if unsafe { self.freelists.by_size_mut(index).push(block) } {
                return;
            }
        }
        self.stats.frees += 1;
        // SAFETY: The block originated from the backing heap.
        unsafe { self.heap.release(block) };
    }

    fn fallback_allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let block = self.heap.allocate(size)?;
        self.stats.fallback_allocations += 1;
        internal::fallback_allocation(size);
        Ok(block)
    }

    #[cfg(feature = "free-threaded")]
    fn object_allocate(
        &mut self,
        desc: &TypeDescriptor,
        size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let arena = self.partitions.handle(HeapPartition::select(desc));
        let block = self.heap.allocate_in(arena, size)?;
        self.stats.fallback_allocations += 1;
        internal::fallback_allocation(size);
        Ok(block)
    }

    #[cfg(not(feature = "free-threaded"))]
    fn object_allocate(
        &mut self,
        desc: &TypeDescriptor,
        size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let _ = desc;
        self.fallback_allocate(size)
    }
}

/// Writes a fresh header (count one) into `block`, zeroing the prefix.
///
/// # Safety
///
/// `block` must hold at least `presize` plus header bytes and be
/// word-aligned.
unsafe fn init_object(
    block: NonNull<u8>,
    desc: &'static TypeDescriptor,
    presize: usize,
) -> NonNull<ObjectHeader> {
    // SAFETY: Guaranteed by the caller.
    unsafe {
        ptr::write_bytes(block.as_ptr(), 0, presize);
        let header = block.as_ptr().add(presize).cast::<ObjectHeader>();
        header.write(ObjectHeader::new(desc));
        NonNull::new_unchecked(header)
    }
}
