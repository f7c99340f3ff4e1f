//! Object headers and reference counting.
//!
//! Every runtime object begins with an [`ObjectHeader`]: the reference
//! count word followed by the type descriptor pointer. The count is the
//! first machine word on purpose — while an object's slot sits on a free
//! list, that word is reinterpreted as the free-list link, so a retained
//! slot never looks like a live object.
//!
//! The count representation follows the build regime: a plain [`Cell`]
//! under the single-lock regime (the runtime lock serializes all
//! accessors), an atomic under `free-threaded`.

#[cfg(not(feature = "free-threaded"))]
use std::cell::Cell;
use std::ptr::NonNull;
#[cfg(feature = "free-threaded")]
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::typedesc::TypeDescriptor;

/// Count value marking an immortal object.
///
/// Immortal objects live for the whole process; increments and decrements
/// are skipped so the value never moves and teardown never fires.
const IMMORTAL_COUNT: usize = usize::MAX >> 1;

#[cfg(not(feature = "free-threaded"))]
#[derive(Debug)]
pub(crate) struct RefCount(Cell<usize>);

#[cfg(not(feature = "free-threaded"))]
impl RefCount {
    pub(crate) const fn new(count: usize) -> Self {
        Self(Cell::new(count))
    }

    pub(crate) fn get(&self) -> usize {
        self.0.get()
    }

    pub(crate) fn inc(&self) {
        self.0.set(self.0.get() + 1);
    }

    /// Decrements and returns the new count.
    pub(crate) fn dec(&self) -> usize {
        let count = self.0.get() - 1;
        self.0.set(count);
        count
    }
}

#[cfg(feature = "free-threaded")]
#[derive(Debug)]
pub(crate) struct RefCount(AtomicUsize);

#[cfg(feature = "free-threaded")]
impl RefCount {
    pub(crate) const fn new(count: usize) -> Self {
        Self(AtomicUsize::new(count))
    }

    /// Uses Acquire ordering so a reader sees the complete effect of any
    /// prior decrement.
    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// Relaxed ordering: an increment is just a counter bump.
    pub(crate) fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements and returns the new count. `AcqRel` ordering synchronizes
    /// the count reaching zero with the destructor that follows.
    pub(crate) fn dec(&self) -> usize {
        self.0.fetch_sub(1, Ordering::AcqRel) - 1
    }
}

/// Header at the start of every runtime object.
///
/// The layout is fixed: count word first, descriptor second. Reference
/// counting goes through [`StackRef`](crate::StackRef) operations or the
/// methods here; the allocator treats everything past the header as opaque
/// payload.
#[repr(C)]
#[derive(Debug)]
pub struct ObjectHeader {
    /// Reference count. First word — overlaid by the free-list link while
    /// the slot is retained.
    count: RefCount,
    /// Descriptor of the object's kind.
    type_desc: &'static TypeDescriptor,
}

impl ObjectHeader {
    /// Creates a header with a count of one.
    #[must_use]
    pub const fn new(type_desc: &'static TypeDescriptor) -> Self {
        Self {
            count: RefCount::new(1),
            type_desc,
        }
    }

    /// Creates a header for an immortal object.
    #[must_use]
    pub const fn new_immortal(type_desc: &'static TypeDescriptor) -> Self {
        Self {
            count: RefCount::new(IMMORTAL_COUNT),
            type_desc,
        }
    }

    /// Returns the current reference count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Returns the object's type descriptor.
    #[must_use]
    pub fn type_desc(&self) -> &'static TypeDescriptor {
        self.type_desc
    }

    /// Whether the object lives for the whole process.
    #[must_use]
    pub fn is_immortal(&self) -> bool {
        self.count.get() >= IMMORTAL_COUNT
    }

    /// Whether references to the object may skip count updates entirely.
    #[must_use]
    pub fn deferred_eligible(&self) -> bool {
        self.is_immortal() || self.type_desc.has_self_managed_deferred_count
    }

    /// Adds one counted unit. No-op on immortal objects.
    pub fn inc_ref(&self) {
        if self.is_immortal() {
            return;
        }
        debug_assert!(self.count.get() > 0, "inc_ref on a dead object");
        self.count.inc();
    }

    /// Drops one counted unit, running the descriptor's destructor when the
    /// count reaches zero. Returns `true` when the object was destroyed.
    ///
    /// Takes a pointer rather than `&self` so the destructor may reclaim
    /// the header's own memory.
    ///
    /// # Safety
    ///
    /// `this` must point to a live object, and the caller must own the unit
    /// being dropped.
    pub unsafe fn dec_ref(this: NonNull<Self>) -> bool {
        // SAFETY: `this` is live per the caller's contract.
        let header = unsafe { this.as_ref() };
        if header.is_immortal() {
            return false;
        }
        debug_assert!(header.count.get() > 0, "reference count underflow");
        if header.count.dec() == 0 {
            if let Some(drop_fn) = header.type_desc.drop_fn {
                // SAFETY: The count just reached zero, so no other reference
                // can observe the object; the destructor takes ownership.
                unsafe { drop_fn(this) };
            }
            return true;
        }
        false
    }
}
