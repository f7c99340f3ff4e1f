//! Ownership protocol tests for tagged stack references.
//!
//! These run identically under both build regimes: the tag encoding flips
//! between them, but the state machine must not.

use std::ptr::NonNull;

use koru_object::{ObjectHeader, StackRef, TypeDescriptor};

static PLAIN: TypeDescriptor = TypeDescriptor::new("plain", 32);
static SELF_COUNTED: TypeDescriptor = TypeDescriptor::new("self_counted", 32).with_deferred_count();

#[test]
fn test_null_sentinel() {
    let null = StackRef::null();
    assert!(null.is_null());
    assert!(StackRef::default().is_null());

    // The explicitly-nullable forms are no-ops on null.
    StackRef::null().xclose();
    let mut slot = StackRef::null();
    slot.clear();
    assert!(slot.is_null());
}

#[test]
fn test_from_new_takes_a_unit() {
    let header = ObjectHeader::new(&PLAIN);
    let obj = NonNull::from(&header);

    let stackref = unsafe { StackRef::from_new(obj) };
    assert!(!stackref.is_deferred());
    assert_eq!(header.count(), 2);
    stackref.close();
    assert_eq!(header.count(), 1);
}

#[test]
fn test_from_new_deferred_is_free() {
    let header = ObjectHeader::new(&SELF_COUNTED);
    let obj = NonNull::from(&header);

    let stackref = unsafe { StackRef::from_new(obj) };
    assert!(stackref.is_deferred());
    assert_eq!(header.count(), 1);
    stackref.close();
    assert_eq!(header.count(), 1);
}

#[test]
fn test_dup_close_pairing_owned() {
    let header = ObjectHeader::new(&PLAIN);
    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
    let before = header.count();

    let copy = stackref.dup();
    assert_eq!(header.count(), before + 1);
    copy.close();
    assert_eq!(header.count(), before);

    stackref.close();
}

#[test]
fn test_dup_close_pairing_deferred() {
    let header = ObjectHeader::new(&SELF_COUNTED);
    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };

    let copy = stackref.dup();
    assert!(copy.is_deferred());
    assert_eq!(header.count(), 1);
    copy.close();
    stackref.close();
    assert_eq!(header.count(), 1);
}

#[test]
fn test_ownership_round_trip_owned() {
    let header = ObjectHeader::new(&PLAIN);
    let start = header.count();

    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
    let owned = stackref.as_owned();
    assert!(!owned.is_deferred());
    owned.close();

    assert_eq!(header.count(), start);
}

#[test]
fn test_ownership_round_trip_deferred() {
    let header = ObjectHeader::new(&SELF_COUNTED);
    let start = header.count();

    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
    let owned = stackref.as_owned();
    assert!(!owned.is_deferred());
    assert_eq!(header.count(), start + 1);
    owned.close();

    assert_eq!(header.count(), start);
}

#[test]
fn test_from_steal_transfers_the_unit() {
    // The header starts with one unit; stealing moves it into the
    // reference without touching the count.
    let header = ObjectHeader::new(&PLAIN);
    let stackref = unsafe { StackRef::from_steal(NonNull::from(&header)) };
    assert!(!stackref.is_deferred());
    assert_eq!(header.count(), 1);

    stackref.close();
    assert_eq!(header.count(), 0);
}

#[test]
fn test_drop_closes_an_open_reference() {
    let header = ObjectHeader::new(&PLAIN);
    {
        let _stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
        assert_eq!(header.count(), 2);
    }
    assert_eq!(header.count(), 1);
}

#[test]
fn test_clear_closes_and_nulls() {
    let header = ObjectHeader::new(&PLAIN);
    let mut slot = unsafe { StackRef::from_new(NonNull::from(&header)) };
    assert_eq!(header.count(), 2);

    slot.clear();
    assert!(slot.is_null());
    assert_eq!(header.count(), 1);

    // Clearing the now-null holder must not close anything again.
    slot.clear();
    assert_eq!(header.count(), 1);
}

#[test]
fn test_borrow_is_a_view() {
    let header = ObjectHeader::new(&PLAIN);
    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
    let before = header.count();

    let view = stackref.borrow();
    assert_eq!(view.type_desc().name, "plain");
    assert_eq!(view.count(), before);
    assert_eq!(view.as_ptr(), NonNull::from(&header));
    assert_eq!(header.count(), before, "borrow must not touch the count");

    stackref.close();
}

#[test]
fn test_immortal_references_are_deferred() {
    let header = ObjectHeader::new_immortal(&PLAIN);
    let obj = NonNull::from(&header);
    let before = header.count();

    let stackref = unsafe { StackRef::from_new(obj) };
    assert!(stackref.is_deferred());
    assert!(stackref.is_heap_safe());

    let via_immortal = unsafe { StackRef::from_immortal(obj) };
    assert!(via_immortal.is_deferred());
    assert!(stackref.ptr_eq(&via_immortal));

    let copy = stackref.dup();
    copy.close();
    via_immortal.close();
    stackref.close();
    assert_eq!(header.count(), before, "immortal counts never move");
}

#[test]
fn test_heap_safe_keeps_immortals_deferred() {
    let header = ObjectHeader::new_immortal(&PLAIN);
    let before = header.count();

    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
    let safe = stackref.heap_safe();
    assert!(safe.is_deferred(), "immortals need no materialized unit");
    assert_eq!(header.count(), before);
    safe.close();
}

#[test]
fn test_heap_safe_materializes_for_self_counted() {
    let header = ObjectHeader::new(&SELF_COUNTED);
    let stackref = unsafe { StackRef::from_new(NonNull::from(&header)) };
    assert!(!stackref.is_heap_safe());

    let safe = stackref.heap_safe();
    assert!(!safe.is_deferred());
    assert!(safe.is_heap_safe());
    assert_eq!(header.count(), 2);
    safe.close();
    assert_eq!(header.count(), 1);
}

#[test]
fn test_ptr_eq_ignores_tags() {
    let header = ObjectHeader::new(&SELF_COUNTED);
    let deferred = unsafe { StackRef::from_new(NonNull::from(&header)) };
    let owned = deferred.dup().as_owned();

    assert!(deferred.is_deferred());
    assert!(!owned.is_deferred());
    assert!(deferred.ptr_eq(&owned));

    let other = ObjectHeader::new(&SELF_COUNTED);
    let other_ref = unsafe { StackRef::from_new(NonNull::from(&other)) };
    assert!(!deferred.ptr_eq(&other_ref));

    owned.close();
    deferred.close();
    other_ref.close();
}

#[test]
fn test_drop_fn_runs_when_last_unit_closes() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DROPPED: AtomicUsize = AtomicUsize::new(0);
    unsafe fn on_drop(_obj: NonNull<ObjectHeader>) {
        DROPPED.fetch_add(1, Ordering::Relaxed);
    }
    static COUNTED: TypeDescriptor = TypeDescriptor::new("counted", 32).with_drop(on_drop);

    let header = ObjectHeader::new(&COUNTED);
    let stackref = unsafe { StackRef::from_steal(NonNull::from(&header)) };
    assert_eq!(DROPPED.load(Ordering::Relaxed), 0);
    stackref.close();
    assert_eq!(DROPPED.load(Ordering::Relaxed), 1);
}
