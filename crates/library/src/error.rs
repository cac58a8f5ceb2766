//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Dependency failures from the storage,
//! record and catalog layers are raised into this crate's [`ErrorKind`] with
//! the original error kept as a child of the tree.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Input that was understood but rejected by a workflow.
///
/// The display text is the message shown back to the user.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[display("Please enter a report reason!")]
    ReasonRequired,
    #[display("This path has already been reported")]
    AlreadyReported,
    #[display("You cannot report this directory!")]
    Locked,
}

/// Classifies the origin of a library failure.
///
/// ### Client Errors
/// - [`ErrorKind::InvalidPath`]
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::Validation`]
/// - [`ErrorKind::ExternalLookup`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Records`]
/// - [`ErrorKind::Catalog`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Requested path escapes the archive root or is malformed.
    #[display("invalid path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// Path or record does not exist.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("{_0}")]
    Validation(#[error(not(source))] ValidationError),
    /// The catalog could not resolve an external series identifier.
    #[display("Failed to find series for MU ID")]
    ExternalLookup(#[error(not(source))] String),
    /// A [`StorageBackend`](trove_storage::StorageBackend) operation failed.
    #[display("storage error")]
    Storage,
    /// A [`Repository`](trove_records::Repository) query failed.
    #[display("record store error")]
    Records,
    /// A [`SeriesCatalog`](crate::SeriesCatalog) call failed.
    #[display("series catalog error")]
    Catalog,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Records | Self::Catalog)
    }

    /// Message suitable for flashing back to the user, for errors that leave
    /// the request otherwise unchanged.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(_) | Self::ExternalLookup(_) => Some(self.to_string()),
            _ => None,
        }
    }
}
