//! Marking infrastructure.
//!
//! Marking is worklist-driven: the visitor keeps an explicit stack instead
//! of recursing, so arbitrarily deep object graphs cannot overflow the
//! native stack.

pub mod roots;

use crate::cell::Cell;
use crate::object::{ObjectRef, Value};

/// Collects reachable cells onto a worklist and marks them
#[derive(Default)]
pub struct MarkingVisitor {
    stack: Vec<ObjectRef>,
}

impl MarkingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consider a value; inline integers are ignored
    pub fn visit(&mut self, value: Value) {
        if let Some(object) = value.as_object() {
            self.visit_object(object);
        }
    }

    /// Consider a cell; already-visited cells are not re-queued
    pub fn visit_object(&mut self, object: ObjectRef) {
        if !object.is_visited() {
            self.stack.push(object);
        }
    }

    /// Drain the worklist, marking and expanding each cell
    pub fn visit_all(&mut self) {
        while let Some(object) = self.stack.pop() {
            if object.is_visited() {
                continue;
            }
            object.mark();
            object.visit_children(self);
        }
    }
}
