//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the read-only view of the
//! archive that path resolution is built on (local filesystem, or an
//! in-memory tree for tests).

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::EntryInfo;
use crate::path::RelativePath;
use async_trait::async_trait;

/// Unified interface for storage backends.
///
/// All operations are asynchronous and take `&self`; implementations hold no
/// per-call mutable state, so calls for different paths are safe to issue
/// concurrently.
///
/// # Path Handling
/// Every path is a [`RelativePath`], which has already been normalized and
/// checked against root traversal. Implementations map it onto their own root.
///
/// # Examples
///
/// ```
/// use trove_storage::{RelativePath, backend::StorageBackend, error::Result};
///
/// async fn count_children(backend: &dyn StorageBackend, raw: &str) -> Result<usize> {
///     let path = RelativePath::parse(raw)?;
///     if backend.exists(&path).await? && !backend.is_file(&path).await? {
///         Ok(backend.list_children(&path).await?.len())
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// Check if anything (file or directory) exists at the path.
    async fn exists(&self, path: &RelativePath) -> Result<bool>;

    /// Get entry metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if nothing
    /// exists at the path.
    async fn stat(&self, path: &RelativePath) -> Result<EntryInfo>;

    /// Check whether the path is a regular file.
    ///
    /// Default implementation of this method inspects the result of
    /// [`stat()`](Self::stat).
    async fn is_file(&self, path: &RelativePath) -> Result<bool> {
        Ok(self.stat(path).await?.kind.is_file())
    }

    /// List the immediate children of a directory.
    ///
    /// # Ordering
    /// Children **must** be returned sorted by name ascending using
    /// [`compare_names`](crate::compare_names). The browser's default
    /// ordering relies on this and never re-sorts.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// directory does not exist, and
    /// [`NotADirectory`](crate::error::ErrorKind::NotADirectory) if the path
    /// is a file. Entries that are neither files nor directories (broken
    /// symlinks, sockets) are skipped.
    async fn list_children(&self, path: &RelativePath) -> Result<Vec<EntryInfo>>;
}
