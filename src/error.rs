//! Error taxonomy for the refactoring-plan engine.
//!
//! Kinds, not types: every operation across the engine raises one of these
//! four variants. Validation errors abort before any edit is produced;
//! during `Execute` the first error aborts plan construction and partial
//! edits are discarded.

use std::path::PathBuf;

/// The error type returned by every operation and by the serializer.
#[derive(Debug, thiserror::Error)]
pub enum RefactorError {
    /// Inputs malformed or preconditions unmet (raised by `Validate`, and
    /// by resolver wrappers when the underlying resolver fails).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The target declaration or interface was not present in the
    /// workspace.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// A read/write/stat against the filesystem failed.
    #[error("file system error for {path}: {message}")]
    FileSystemError {
        /// The path the failing operation was performed against.
        path: PathBuf,
        /// The underlying OS or I/O error message.
        message: String,
    },

    /// Post-edit source failed to parse (surfaced via the formatter).
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, RefactorError>;

impl RefactorError {
    /// Build a [`RefactorError::FileSystemError`] from a path and an
    /// [`std::io::Error`].
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        RefactorError::FileSystemError { path: path.into(), message: err.to_string() }
    }
}
