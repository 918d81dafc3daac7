//! The explicit root registry.
//!
//! Conservative stack scanning covers values live in the current call
//! chain, but process-wide cells (the core class graph, values parked by
//! native code) need explicit registration. Registration is counted, so a
//! value registered twice stays rooted until both registrations are gone.

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::hashmap::Hashmap;
use crate::marker::MarkingVisitor;
use crate::object::{ObjectRef, Value};

lazy_static! {
    static ref ROOTS: Mutex<Hashmap<usize, usize>> = Mutex::new(Hashmap::new());
}

/// Pin a value as a GC root
pub fn register_root(value: Value) {
    let Some(object) = value.as_object() else {
        return;
    };
    let mut roots = ROOTS.lock();
    let count = roots.get(object.addr()).copied().unwrap_or(0);
    roots.put(object.addr(), count + 1);
}

/// Drop one registration of a root
pub fn unregister_root(value: Value) {
    let Some(object) = value.as_object() else {
        return;
    };
    let mut roots = ROOTS.lock();
    match roots.get(object.addr()).copied() {
        Some(count) if count > 1 => {
            roots.put(object.addr(), count - 1);
        },
        Some(_) => {
            roots.remove(object.addr());
        },
        None => {},
    }
}

/// Number of distinct registered roots
pub fn root_count() -> usize {
    ROOTS.lock().size()
}

/// Queue every registered root for marking
pub(crate) fn visit_registered(visitor: &mut MarkingVisitor) {
    for (addr, _) in ROOTS.lock().iter() {
        // Safety: registered roots are live by contract; unregister before
        // dropping the last reference.
        if let Some(object) = unsafe { ObjectRef::from_ptr(addr as *mut crate::Object) } {
            visitor.visit_object(object);
        }
    }
}

/// Remove every registration (test teardown)
pub fn clear_roots() {
    let mut roots = ROOTS.lock();
    *roots = Hashmap::new();
}
