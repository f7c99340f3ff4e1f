//! Free-threaded regime tests: per-thread contexts, deferred tagging
//! across threads, partition routing.
#![cfg(feature = "free-threaded")]

use std::ptr::NonNull;
use std::thread;

use koru_object::{
    ExecContext, FreeListConfig, HeapPartition, ObjectHeader, Runtime, StackRef, TypeDescriptor,
};

static PLAIN: TypeDescriptor = TypeDescriptor::new("plain", 32);
static SELF_COUNTED: TypeDescriptor = TypeDescriptor::new("self_counted", 32).with_deferred_count();

static TRUE_SINGLETON: ObjectHeader = ObjectHeader::new_immortal(&PLAIN);

#[test]
fn test_immortals_are_deferred_on_every_thread() {
    let before = TRUE_SINGLETON.count();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let obj = NonNull::from(&TRUE_SINGLETON);
                let stackref = unsafe { StackRef::from_new(obj) };
                assert!(stackref.is_deferred());
                assert!(stackref.is_heap_safe());

                // heap_safe must not materialize anything for immortals.
                let safe = stackref.heap_safe();
                assert!(safe.is_deferred());
                safe.close();
            });
        }
    });

    assert_eq!(TRUE_SINGLETON.count(), before, "no thread performed an increment");
}

#[test]
fn test_deferred_reads_scale_without_increments() {
    static SHARED: ObjectHeader = ObjectHeader::new(&SELF_COUNTED);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let obj = NonNull::from(&SHARED);
                // Any thread may read through a deferred reference without
                // an atomic increment.
                let stackref = unsafe { StackRef::from_new(obj) };
                assert!(stackref.is_deferred());
                let copy = stackref.dup();
                assert_eq!(copy.borrow().type_desc().name, "self_counted");
                copy.close();
                stackref.close();
            });
        }
    });

    assert_eq!(SHARED.count(), 1);
}

#[test]
fn test_owned_reference_moves_between_threads() {
    static SHARED: ObjectHeader = ObjectHeader::new(&SELF_COUNTED);

    let owned = unsafe { StackRef::from_new(NonNull::from(&SHARED)) }.as_owned();
    assert_eq!(SHARED.count(), 2);

    thread::spawn(move || owned.close()).join().unwrap();
    assert_eq!(SHARED.count(), 1);
}

#[test]
fn test_per_thread_contexts_do_not_contend() {
    let runtime = Runtime::new(&FreeListConfig::default());

    thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                let mut ctx = runtime.create_context();
                let block = ctx.acquire(64).unwrap();
                unsafe { ctx.release(block, 64) };
                let reused = ctx.acquire(64).unwrap();
                assert_eq!(reused, block, "each thread reuses its own slots");
                unsafe { ctx.release(reused, 64) };
                runtime.retire_context(ctx, false);
            });
        }
    });

    let stats = runtime.stats();
    assert_eq!(stats.fallback_allocations, 3, "one miss per thread");
    assert_eq!(stats.served_from_freelist, 3);
    assert_eq!(stats.frees, 3, "retirement drained each registry");
}

#[test]
fn test_each_thread_gets_its_own_arena_handles() {
    let runtime = Runtime::new(&FreeListConfig::default());

    let handles: Vec<u32> = thread::scope(|scope| {
        let workers: Vec<_> = (0..3)
            .map(|_| {
                scope.spawn(|| {
                    let ctx = runtime.create_context();
                    let id = ctx.partitions().handle(HeapPartition::Plain).id();
                    runtime.retire_context(ctx, false);
                    id
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    for (i, a) in handles.iter().enumerate() {
        for b in &handles[i + 1..] {
            assert_ne!(a, b, "partition state is never shared between threads");
        }
    }
}

#[test]
fn test_partition_routing_from_descriptor_flags() {
    static TRACKED: TypeDescriptor = TypeDescriptor::new("tracked", 32).with_cyclic_gc();
    static PREFIXED: TypeDescriptor = TypeDescriptor::new("prefixed", 32)
        .with_cyclic_gc()
        .with_prefix_header();

    assert_eq!(HeapPartition::select(&PLAIN), HeapPartition::Plain);
    assert_eq!(HeapPartition::select(&TRACKED), HeapPartition::GcTracked);
    assert_eq!(
        HeapPartition::select(&PREFIXED),
        HeapPartition::GcTrackedWithPrefix
    );
}

#[test]
fn test_context_allocates_objects_through_partitions() {
    static TRACKED: TypeDescriptor = TypeDescriptor::new("tracked", 48).with_cyclic_gc();

    let mut ctx = ExecContext::new(&FreeListConfig::default());
    let obj = ctx.new_object(&TRACKED).unwrap();
    let header = unsafe { obj.as_ref() };
    assert_eq!(header.type_desc().name, "tracked");
    unsafe { ctx.free_object(obj) };
}
