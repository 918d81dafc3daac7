//! beryl-util - Foundation types shared by the Beryl front end and runtime.
//!
//! This crate provides the building blocks every other Beryl crate leans on:
//!
//! - [`span`] - source locations (`FileId`, `Span`) and the `SourceMap` used
//!   to render error excerpts
//! - [`symbol`] - the process-wide string interner behind [`Symbol`]
//! - [`diagnostic`] - diagnostics with stable codes and a collecting handler
//! - [`error`] - `thiserror` error enums for the util types themselves
//!
//! Symbols are shared between the compiler front end and the runtime: the
//! runtime keys instance-variable and method tables by `Symbol`, so symbol
//! equality is index equality (the interning guarantee).

pub mod diagnostic;
pub mod error;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
pub use error::{SourceMapError, SourceMapResult};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

// Re-export the fast hash collections used across the workspace.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
