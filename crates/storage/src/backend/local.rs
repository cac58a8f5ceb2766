//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for the local filesystem.
//! The archive is a configured directory and is read using `tokio::fs` for
//! async I/O. Nothing here ever writes to the archive.

use crate::error::{ErrorKind, Result};
use crate::models::{EntryInfo, EntryKind, compare_names};
use crate::{RelativePath, StorageBackend};
use async_trait::async_trait;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage backend.
///
/// All paths are resolved against the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use trove_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/path/to/archive")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the archive
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to an existing archive directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or does not point at an
    /// existing directory. Unlike a library the archive is never created on
    /// demand.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
        }
        // Use non-async here; it'll only happen once on startup and it's not
        // worth the hassle of making the constructor async.
        match root.metadata() {
            Ok(metadata) if metadata.is_dir() => {},
            Ok(_) => exn::bail!(ErrorKind::NotADirectory(root.display().to_string())),
            Err(e) => exn::bail!(Self::map_io_error(e, root.display())),
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative archive path.
    fn absolute_path(&self, path: &RelativePath) -> PathBuf {
        self.root.join(path.to_storage_path())
    }

    /// Re-use same data collection from file metadata for both list and stat functions.
    ///
    /// Returns `None` for anything that is neither a file nor a directory.
    fn metadata(path: RelativePath, metadata: &Metadata) -> Result<Option<EntryInfo>> {
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            return Ok(None);
        };
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(Some(EntryInfo::new(path, kind, metadata.len(), modified)))
    }

    fn map_io_error(e: std::io::Error, path: impl std::fmt::Display) -> ErrorKind {
        match e.kind() {
            // ENOTDIR: a parent segment is a regular file, so nothing lives here.
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => ErrorKind::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &RelativePath) -> Result<bool> {
        let abs_path = self.absolute_path(path);
        match fs::try_exists(&abs_path).await {
            Ok(exists) => Ok(exists),
            Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => Ok(false),
            Err(e) => exn::bail!(Self::map_io_error(e, path)),
        }
    }

    async fn stat(&self, path: &RelativePath) -> Result<EntryInfo> {
        let abs_path = self.absolute_path(path);
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        match Self::metadata(path.clone(), &metadata)? {
            Some(info) => Ok(info),
            // Sockets, fifos and friends are invisible to the browser.
            None => exn::bail!(ErrorKind::NotFound(path.to_string())),
        }
    }

    #[tracing::instrument(level = "debug", skip(self), fields(backend = %self.name))]
    async fn list_children(&self, path: &RelativePath) -> Result<Vec<EntryInfo>> {
        let abs_path = self.absolute_path(path);
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(path.to_string()));
        }

        let mut entries = fs::read_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, path))? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(parent = %path, name = ?entry.file_name(), "skipping entry with non UTF-8 name");
                continue;
            };
            // Follow symlinks so linked directories are browsable.
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                // Note: silently drop what is most likely a broken symlink.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => exn::bail!(Self::map_io_error(e, entry.path().display())),
            };
            if let Some(info) = Self::metadata(path.join(&name)?, &metadata)? {
                children.push(info);
            }
        }
        children.sort_by(|a, b| compare_names(a.name(), b.name()));
        Ok(children)
    }
}
