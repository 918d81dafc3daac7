//! Shared fixtures for the runtime-core integration tests.
//!
//! The heap is a process-wide singleton with a single-threaded mutator
//! contract, while the test harness runs tests on multiple threads, so
//! every test that touches the heap serializes through [`heap_lock`].

#![allow(dead_code)]

use beryl_util::Symbol;
use bgc::marker::roots;
use bgc::object::{Object, ObjectRef, ObjectType, Value};
use bgc::{heap, runtime};
use lazy_static::lazy_static;
use parking_lot::{Mutex, MutexGuard};

lazy_static! {
    static ref HEAP_TEST_LOCK: Mutex<()> = Mutex::new(());
}

/// Serialize heap-touching tests
pub fn heap_lock() -> MutexGuard<'static, ()> {
    HEAP_TEST_LOCK.lock()
}

/// Bootstrap the core class graph once
pub fn init_runtime() {
    runtime::init();
}

/// Allocate one plain object of class `Object`
pub fn new_plain_object() -> ObjectRef {
    init_runtime();
    heap::allocate_object(Object::new(ObjectType::Object, Some(runtime::core().object_class)))
}

/// Allocate a chain of `len` objects, each holding the next in an ivar
///
/// Returns the cell addresses, head first. Only the head keeps the rest
/// reachable. Callers must disable collection while the chain is under
/// construction: until the head is rooted, the partial chain hangs off
/// plain Rust locals that no root or stack scan covers.
pub fn alloc_chain(len: usize) -> Vec<usize> {
    init_runtime();
    let next_sym = Symbol::intern("next");
    let mut addrs = Vec::with_capacity(len);
    let mut next: Option<ObjectRef> = None;
    for _ in 0..len {
        let mut object = new_plain_object();
        if let Some(next_ref) = next {
            object
                .ivar_set(next_sym, Value::object(next_ref))
                .expect("fresh object is not frozen");
        }
        next = Some(object);
        addrs.push(object.addr());
    }
    addrs.reverse();
    addrs
}

/// Register the head of a chain as a GC root
pub fn root_addr(addr: usize) {
    let object = unsafe { ObjectRef::from_ptr(addr as *mut Object) }.expect("non-null");
    roots::register_root(Value::object(object));
}

/// Drop the registration for a chain head
pub fn unroot_addr(addr: usize) {
    let object = unsafe { ObjectRef::from_ptr(addr as *mut Object) }.expect("non-null");
    roots::unregister_root(Value::object(object));
}

/// How many of the given cell addresses are still live?
pub fn live_count(addrs: &[usize]) -> usize {
    addrs.iter().filter(|addr| heap::is_live_cell(**addr)).count()
}
