//! Recursion guards for cyclic structures.
//!
//! Operations like inspect on a self-referencing array would recurse
//! forever. A guard keeps a process-wide identity set of instances
//! currently being visited: re-entering an instance short-circuits
//! (the callback receives `true`) instead of erroring. The paired variant
//! tracks ordered pairs for mutual-equality recursion.

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::hashmap::Hashmap;

lazy_static! {
    static ref DID_RUN: Mutex<Hashmap<usize, ()>> = Mutex::new(Hashmap::new());
    static ref PAIRS_DID_RUN: Mutex<Hashmap<usize, Hashmap<usize, ()>>> =
        Mutex::new(Hashmap::new());
}

/// Guard for a single instance
pub struct RecursionGuard {
    instance: usize,
}

impl RecursionGuard {
    /// Guard the given instance address
    pub fn new(instance: usize) -> Self {
        debug_assert!(instance != 0);
        Self { instance }
    }

    /// Run `callback`; it receives `true` when the instance is already
    /// being visited further up the stack
    pub fn run<R>(&self, callback: impl FnOnce(bool) -> R) -> R {
        if self.seen() {
            return callback(true);
        }
        self.mark();
        // the mark must clear even if the callback unwinds
        struct ClearOnDrop<'a>(&'a RecursionGuard);
        impl Drop for ClearOnDrop<'_> {
            fn drop(&mut self) {
                self.0.clear();
            }
        }
        let _clear = ClearOnDrop(self);
        callback(false)
    }

    fn seen(&self) -> bool {
        DID_RUN.lock().contains(self.instance)
    }

    fn mark(&self) {
        DID_RUN.lock().put(self.instance, ());
    }

    fn clear(&self) {
        DID_RUN.lock().remove(self.instance);
    }
}

/// Guard for an ordered pair of instances
pub struct PairedRecursionGuard {
    instance: usize,
    other_instance: usize,
}

impl PairedRecursionGuard {
    pub fn new(instance: usize, other_instance: usize) -> Self {
        debug_assert!(instance != 0);
        debug_assert!(other_instance != 0);
        Self {
            instance,
            other_instance,
        }
    }

    /// Run `callback`; it receives `true` when this exact pair is already
    /// being visited
    pub fn run<R>(&self, callback: impl FnOnce(bool) -> R) -> R {
        if self.seen() {
            return callback(true);
        }
        self.mark();
        struct ClearOnDrop<'a>(&'a PairedRecursionGuard);
        impl Drop for ClearOnDrop<'_> {
            fn drop(&mut self) {
                self.0.clear();
            }
        }
        let _clear = ClearOnDrop(self);
        callback(false)
    }

    fn seen(&self) -> bool {
        PAIRS_DID_RUN
            .lock()
            .get(self.instance)
            .is_some_and(|companions| companions.contains(self.other_instance))
    }

    fn mark(&self) {
        let mut pairs = PAIRS_DID_RUN.lock();
        if pairs.get(self.instance).is_none() {
            pairs.put(self.instance, Hashmap::new());
        }
        if let Some(companions) = pairs.get_mut(self.instance) {
            companions.put(self.other_instance, ());
        }
    }

    fn clear(&self) {
        let mut pairs = PAIRS_DID_RUN.lock();
        let empty = match pairs.get_mut(self.instance) {
            Some(companions) => {
                companions.remove(self.other_instance);
                companions.is_empty()
            },
            None => false,
        };
        if empty {
            pairs.remove(self.instance);
        }
    }
}
