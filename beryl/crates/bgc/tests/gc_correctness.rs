//! Collection behavior: reachability through roots, cycle collection,
//! mark-bit hygiene across cycles.
//!
//! These tests never install a stack floor, so collection is a pure
//! function of the explicit root registry - which is what makes the
//! freed/retained assertions deterministic.

mod common;

use beryl_util::Symbol;
use bgc::heap;
use bgc::object::Value;
use common::heap_lock;

#[test]
fn rooted_chain_survives_and_unrooted_chain_dies() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let addrs = common::alloc_chain(200);
    common::root_addr(addrs[0]);
    heap::gc_enable();

    heap::collect();
    assert_eq!(
        common::live_count(&addrs),
        addrs.len(),
        "every cell reachable from the rooted head must survive"
    );

    common::unroot_addr(addrs[0]);
    heap::collect();
    assert_eq!(
        common::live_count(&addrs),
        0,
        "dropping the root must free the whole chain"
    );
}

#[test]
fn severed_tail_is_collected() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let addrs = common::alloc_chain(50);
    common::root_addr(addrs[0]);

    // cut the chain in the middle
    let mut middle = unsafe {
        bgc::object::ObjectRef::from_ptr(addrs[24] as *mut bgc::Object).expect("non-null")
    };
    middle
        .ivar_set(Symbol::intern("next"), Value::integer(0))
        .unwrap();

    heap::gc_enable();
    heap::collect();
    assert_eq!(common::live_count(&addrs[..25]), 25, "head half survives");
    assert_eq!(common::live_count(&addrs[25..]), 0, "tail half is freed");

    common::unroot_addr(addrs[0]);
    heap::collect();
}

#[test]
fn cycles_are_collected() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let next = Symbol::intern("next");
    let mut a = common::new_plain_object();
    let mut b = common::new_plain_object();
    a.ivar_set(next, Value::object(b)).unwrap();
    b.ivar_set(next, Value::object(a)).unwrap();
    let (addr_a, addr_b) = (a.addr(), b.addr());

    common::root_addr(addr_a);
    heap::gc_enable();
    heap::collect();
    assert!(heap::is_live_cell(addr_a));
    assert!(heap::is_live_cell(addr_b), "cycle member reachable via a");

    common::unroot_addr(addr_a);
    heap::collect();
    assert!(!heap::is_live_cell(addr_a), "cycles must not leak");
    assert!(!heap::is_live_cell(addr_b), "cycles must not leak");
}

#[test]
fn marks_are_cleared_between_cycles() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let addrs = common::alloc_chain(20);
    common::root_addr(addrs[0]);
    heap::gc_enable();

    // surviving two cycles requires the mark bits to reset after each
    heap::collect();
    heap::collect();
    assert_eq!(common::live_count(&addrs), addrs.len());

    common::unroot_addr(addrs[0]);
    heap::collect();
    assert_eq!(common::live_count(&addrs), 0);
}

#[test]
fn ivar_values_keep_objects_alive() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let mut holder = common::new_plain_object();
    let held = common::new_plain_object();
    holder
        .ivar_set(Symbol::intern("@held"), Value::object(held))
        .unwrap();
    let held_addr = held.addr();

    common::root_addr(holder.addr());
    heap::gc_enable();
    heap::collect();
    assert!(heap::is_live_cell(held_addr));

    common::unroot_addr(holder.addr());
    heap::collect();
    assert!(!heap::is_live_cell(held_addr));
}

#[test]
fn globals_are_roots() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();

    let object = common::new_plain_object();
    let addr = object.addr();
    let name = Symbol::intern("$gc_test_global");
    bgc::globals::set(name, Value::object(object)).unwrap();

    heap::gc_enable();
    heap::collect();
    assert!(heap::is_live_cell(addr), "global-held values must survive");

    bgc::globals::set(name, Value::integer(0)).unwrap();
    heap::collect();
    assert!(!heap::is_live_cell(addr));
}
