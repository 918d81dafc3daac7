//! Error types for the runtime core.
//!
//! Allocation failure is deliberately absent: the underlying aligned
//! allocator aborts the process via `handle_alloc_error`, per the heap's
//! failure contract.

use thiserror::Error;

/// Main error type for runtime-core operations
#[derive(Debug, Error)]
pub enum BgcError {
    #[error("library not found: {name} ({reason})")]
    LibraryNotFound { name: String, reason: String },

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("unsupported native signature: {0}")]
    UnsupportedSignature(String),

    #[error("wrong native type for argument {index}: expected {expected}, got {provided}")]
    FfiTypeError {
        index: usize,
        expected: String,
        provided: String,
    },

    #[error("wrong number of arguments: expected {expected}, got {provided}")]
    FfiArityError { expected: usize, provided: usize },

    #[error("invalid enum value: {0}")]
    InvalidEnumValue(String),

    #[error("{0} is a read-only variable")]
    ReadOnlyGlobal(String),

    #[error("can't modify frozen object")]
    FrozenError,

    #[error("undefined method '{0}'")]
    NoMethodError(String),
}

/// Result type alias for runtime-core operations
pub type Result<T> = std::result::Result<T, BgcError>;
