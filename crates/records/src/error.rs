//! Record store error types.
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::RecordId;
use derive_more::{Display, Error};

/// A record store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for record store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("path record not found: {_0}")]
    RecordNotFound(#[error(not(source))] RecordId),
    /// An open report already exists for the record.
    #[display("path record already reported: {_0}")]
    AlreadyReported(#[error(not(source))] RecordId),
    /// Locked records cannot be reported.
    #[display("path record is locked: {_0}")]
    Locked(#[error(not(source))] RecordId),
    /// Stored data failed to convert back into a model.
    #[display("invalid record data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}
