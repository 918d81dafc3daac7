//! Allocation behavior: size-class service, block alignment, growth.
//!
//! Tests that build object graphs do so with collection paused: these
//! tests never install a stack floor, so a collection triggered mid-build
//! would sweep the half-built graph out from under the Rust locals
//! holding it.

mod common;

use bgc::heap::{self, HEAP_BLOCK_SIZE};
use common::heap_lock;

#[test]
fn allocation_returns_distinct_aligned_cells() {
    let _guard = heap_lock();
    let a = heap::allocate(64) as usize;
    let b = heap::allocate(64) as usize;
    assert_ne!(a, b);
    assert_eq!(a % 16, 0);
    assert_eq!(b % 16, 0);
}

#[test]
fn block_alignment_mask_recovers_header() {
    let _guard = heap_lock();
    let cell = heap::allocate(128) as usize;
    let block = heap::owning_block_addr(cell);
    assert_eq!(block % HEAP_BLOCK_SIZE, 0);
    assert!(cell > block);
    assert!(cell < block + HEAP_BLOCK_SIZE);
    // interior pointers resolve to the same block
    assert_eq!(heap::owning_block_addr(cell + 100), block);
}

#[test]
fn requested_sizes_round_up_to_a_size_class() {
    let _guard = heap_lock();
    // neighbors from the same class land in the same block until it fills
    let a = heap::allocate(50) as usize;
    let b = heap::allocate(60) as usize;
    assert_eq!(heap::owning_block_addr(a), heap::owning_block_addr(b));
    // a very different size goes to a different class (different block)
    let c = heap::allocate(1000) as usize;
    assert_ne!(heap::owning_block_addr(a), heap::owning_block_addr(c));
}

#[test]
fn heap_grows_when_a_class_fills() {
    let _guard = heap_lock();
    common::init_runtime();
    heap::gc_disable();
    let before = heap::stats().total_cells;

    // enough objects to need more than one block of their size class
    let addrs = common::alloc_chain(600);
    common::root_addr(addrs[0]);

    let after = heap::stats().total_cells;
    assert!(after > before, "heap should have added blocks");
    assert_eq!(common::live_count(&addrs), addrs.len());

    heap::gc_enable();
    heap::collect();
    assert_eq!(
        common::live_count(&addrs),
        addrs.len(),
        "rooted chain must survive"
    );

    common::unroot_addr(addrs[0]);
    heap::collect();
}

#[test]
fn gc_disable_suppresses_collection() {
    let _guard = heap_lock();
    common::init_runtime();

    heap::gc_disable();
    let addrs = common::alloc_chain(10);
    // no roots: the chain is garbage

    let collections_before = heap::stats().collections;
    heap::collect();
    assert_eq!(heap::stats().collections, collections_before);
    assert_eq!(common::live_count(&addrs), addrs.len());

    heap::gc_enable();
    heap::collect();
    assert_eq!(common::live_count(&addrs), 0);
}
