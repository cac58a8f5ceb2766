//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nothing exists at the path
    #[display("path not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied by the filesystem
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Directory operation attempted on a file
    #[display("not a directory: {_0}")]
    NotADirectory(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// Stored hash is not a hex-encoded BLAKE3 digest
    #[display("invalid path hash: {_0}")]
    InvalidHash(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
