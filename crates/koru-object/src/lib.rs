//! Object lifecycle core for the Koru runtime.
//!
//! `koru-object` implements the two pieces the interpreter loop leans on
//! hardest: the **slot allocator** that recycles fixed-size memory blocks
//! for short-lived objects, and the **tagged stack reference** used to hold
//! values on the evaluation stack without always paying for a
//! reference-count update.
//!
//! # Allocation
//!
//! Small requests are bucketed into 16-byte size classes and served from
//! intrusive free lists owned by an [`ExecContext`]; a handful of hot,
//! fixed-shape object kinds get dedicated lists on top ([`CachedKind`]).
//! Every miss — and every request past the threshold — falls through to a
//! [`BackingHeap`], whose out-of-memory failures propagate verbatim.
//! Push and pop are O(1) head operations; nothing on the hot path blocks
//! or allocates.
//!
//! # Stack references
//!
//! A [`StackRef`] packs "address + ownership tag" into one machine word.
//! An *Owned* reference carries one counted unit of the object's lifetime;
//! a *Deferred* reference carries none, because the object is immortal or
//! counts itself. The fixed vocabulary on `StackRef` (`from_new`, `dup`,
//! `close`, `borrow`, ...) is the only legal way to touch one.
//!
//! # Build regimes
//!
//! Two mutually exclusive concurrency regimes are selected at build time
//! and never mixed at runtime:
//!
//! - **Single-lock** (default): one [`Runtime`] lock serializes all
//!   execution. Counts are plain cells, free-list writes are plain stores,
//!   and Deferred tagging is reserved for immortal singletons.
//! - **Free-threaded** (`free-threaded` feature): threads run concurrently,
//!   each with its own context and per-partition arena handles
//!   ([`HeapPartition`]). Counts are atomic, free-list link writes are
//!   relaxed atomic stores, the reference tag polarity inverts, and
//!   Deferred tagging becomes load-bearing.
//!
//! # Quick start
//!
//! ```ignore
//! use koru_object::{ExecContext, FreeListConfig, StackRef, TypeDescriptor};
//!
//! static PAIR: TypeDescriptor = TypeDescriptor::new("pair", 32).with_small_slot();
//!
//! let mut ctx = ExecContext::new(&FreeListConfig::default());
//! let obj = ctx.new_object(&PAIR)?;
//!
//! // Move the allocation's unit into a stack slot, share it, drop it.
//! let slot = unsafe { StackRef::from_steal(obj) };
//! let copy = slot.dup();
//! copy.close();
//! slot.close();
//!
//! ctx.clear_all(true);
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod alloc;
mod config;
mod context;
mod error;
mod freelist;
mod heap;
mod object;
#[cfg(feature = "free-threaded")]
mod partition;
mod stackref;
mod stats;
mod tracing;
mod typedesc;

pub use alloc::PREFIX_HEADER_SIZE;
pub use config::FreeListConfig;
pub use context::{ExecContext, Runtime};
pub use error::AllocError;
pub use freelist::{
    size_class_bytes, size_class_index, CachedKind, FreeList, FreeListRegistry, ALIGNMENT,
    ALIGNMENT_SHIFT, MAX_CACHED_SEQ_LEN, NB_SMALL_SIZE_CLASSES, SMALL_REQUEST_THRESHOLD,
};
pub use heap::{system_heap, BackingHeap, SystemHeap};
pub use object::ObjectHeader;
#[cfg(feature = "free-threaded")]
pub use partition::{ArenaHandle, HeapPartition, PartitionHandles};
pub use stackref::{Borrowed, StackRef};
pub use stats::{AllocStats, RuntimeStats};
pub use typedesc::{DropFn, TypeDescriptor};
