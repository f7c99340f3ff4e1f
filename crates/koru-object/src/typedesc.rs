//! Static type descriptors.
//!
//! Every object kind in the runtime is described by one `&'static`
//! [`TypeDescriptor`]. The descriptor carries the properties the allocator
//! and the stack-reference layer consult: heap partition routing flags,
//! small-slot eligibility, and whether the kind opts into deferred
//! reference counting.

use std::ptr::NonNull;

use crate::object::ObjectHeader;

/// Type-erased destructor invoked when an object's count reaches zero.
///
/// The destructor owns teardown of the value and is responsible for
/// returning the object's memory, typically through
/// [`ExecContext::free_object`](crate::ExecContext::free_object).
pub type DropFn = unsafe fn(NonNull<ObjectHeader>);

/// Per-kind properties consumed by the allocator and reference layer.
///
/// Descriptors are plain const data; the runtime defines one `static` per
/// object kind and threads `&'static` references through object headers.
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    /// Kind name, for diagnostics only.
    pub name: &'static str,
    /// Instance size in bytes, excluding any prefix header.
    pub basic_size: usize,
    /// Whether instances are tracked by the cycle collector.
    pub participates_in_cyclic_gc: bool,
    /// Whether instances carry a collector prefix ahead of the header.
    pub has_prefix_header: bool,
    /// Whether freed instances may be retained on a small-slot free list.
    pub eligible_for_small_slot: bool,
    /// Whether instances maintain their own internally-synchronized count,
    /// making references to them deferred-eligible.
    pub has_self_managed_deferred_count: bool,
    /// Destructor run when the count reaches zero.
    pub drop_fn: Option<DropFn>,
}

impl TypeDescriptor {
    /// Creates a descriptor with all flags off and no destructor.
    #[must_use]
    pub const fn new(name: &'static str, basic_size: usize) -> Self {
        Self {
            name,
            basic_size,
            participates_in_cyclic_gc: false,
            has_prefix_header: false,
            eligible_for_small_slot: false,
            has_self_managed_deferred_count: false,
            drop_fn: None,
        }
    }

    /// Marks instances as tracked by the cycle collector.
    #[must_use]
    pub const fn with_cyclic_gc(mut self) -> Self {
        self.participates_in_cyclic_gc = true;
        self
    }

    /// Marks instances as carrying a collector prefix header.
    #[must_use]
    pub const fn with_prefix_header(mut self) -> Self {
        self.has_prefix_header = true;
        self
    }

    /// Allows freed instances onto the small-slot free lists.
    #[must_use]
    pub const fn with_small_slot(mut self) -> Self {
        self.eligible_for_small_slot = true;
        self
    }

    /// Marks the kind's count as self-managed, enabling deferred references.
    #[must_use]
    pub const fn with_deferred_count(mut self) -> Self {
        self.has_self_managed_deferred_count = true;
        self
    }

    /// Sets the destructor run when the count reaches zero.
    #[must_use]
    pub const fn with_drop(mut self, drop_fn: DropFn) -> Self {
        self.drop_fn = Some(drop_fn);
        self
    }
}
