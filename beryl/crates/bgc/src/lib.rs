//! bgc - The Beryl garbage-collected runtime core.
//!
//! This crate owns the memory and object model the evaluator runs on:
//!
//! - [`heap`] - a bump-free, size-class-segregated allocator over 32 KiB
//!   aligned blocks with a mark-sweep, non-moving collector
//! - [`marker`] - the marking worklist, conservative stack scanning, and
//!   the explicit root registry
//! - [`object`] - [`Value`] (inline integers or heap pointers), [`Object`]
//!   with class pointer / singleton class / instance variables, and method
//!   lookup with visibility
//! - [`hashmap`] - the load-factor-managed chained hash table used for
//!   instance variables, method tables, globals, and identity sets
//! - [`globals`] - the process-wide global-variable table with access hooks
//! - [`recursion_guard`] - identity-set guards for cyclic operations
//! - [`ffi`] - the native-library loader and `attach_function` surface
//! - [`runtime`] - bootstrap of the core class graph
//!
//! The whole crate assumes exclusive single-threaded access from the
//! mutator; the mutexes guarding process-wide state serialize accidental
//! cross-thread use rather than enabling parallelism.

pub mod cell;
pub mod config;
pub mod error;
#[cfg(unix)]
pub mod ffi;
pub mod globals;
pub mod hashmap;
pub mod heap;
pub mod marker;
pub mod object;
pub mod recursion_guard;
pub mod runtime;

pub use cell::Cell;
pub use config::GcConfig;
pub use error::{BgcError, Result};
pub use hashmap::Hashmap;
pub use object::{Object, ObjectData, ObjectRef, ObjectType, Value};
pub use recursion_guard::{PairedRecursionGuard, RecursionGuard};
