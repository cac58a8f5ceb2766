//! Turning a raw request path into a loaded archive entry.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use std::ops::Deref;
use tracing::instrument;
use trove_records::{PathRecord, Repository};
use trove_storage::error::ErrorKind as StorageErrorKind;
use trove_storage::{Breadcrumb, EntryInfo, PathHash, RelativePath, StorageBackend};

/// An archive entry that exists, with its record loaded if it is a directory.
///
/// Built per request and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    pub relative: RelativePath,
    pub hash: PathHash,
    pub info: EntryInfo,
    /// Always `Some` for directories, always `None` for files.
    pub record: Option<PathRecord>,
}

impl ResolvedPath {
    pub fn is_root(&self) -> bool {
        self.relative.is_root()
    }

    pub fn is_file(&self) -> bool {
        self.info.kind.is_file()
    }

    /// First segment below the root; the fallback page title.
    pub fn relative_top(&self) -> Option<&str> {
        self.relative.top()
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.relative.breadcrumbs()
    }

    /// Name-ordered children of this directory.
    pub async fn children(&self, backend: &dyn StorageBackend) -> Result<Vec<EntryInfo>> {
        if self.is_file() {
            exn::bail!(ErrorKind::InvalidPath(self.relative.to_string()));
        }
        match backend.list_children(&self.relative).await {
            Ok(children) => Ok(children),
            Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => {
                Err(e).or_raise(|| ErrorKind::NotFound(self.relative.to_string()))
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
        }
    }
}

/// Resolve raw request input into an existing entry.
///
/// # Errors
/// - [`InvalidPath`](ErrorKind::InvalidPath) if the input escapes the root or is malformed,
/// - [`NotFound`](ErrorKind::NotFound) if nothing exists there,
/// - [`Storage`](ErrorKind::Storage) or [`Records`](ErrorKind::Records) on dependency failures.
#[instrument(level = "debug", skip(backend, records))]
pub async fn resolve(backend: &dyn StorageBackend, records: &Repository, raw: &str) -> Result<ResolvedPath> {
    let relative = RelativePath::parse(raw).or_raise(|| ErrorKind::InvalidPath(raw.to_string()))?;
    if !backend.exists(&relative).await.or_raise(|| ErrorKind::Storage)? {
        exn::bail!(ErrorKind::NotFound(relative.to_string()));
    }
    let info = match backend.stat(&relative).await {
        Ok(info) => info,
        // Removed between the two calls, or not something the browser can show.
        Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => {
            return Err(e).or_raise(|| ErrorKind::NotFound(relative.to_string()));
        },
        Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
    };
    let hash = PathHash::of(&relative);
    let record = match info.kind.is_directory() {
        true => Some(records.get_or_create(&hash).await.or_raise(|| ErrorKind::Records)?),
        false => None,
    };
    Ok(ResolvedPath { relative, hash, info, record })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use trove_records::Database;
    use trove_storage::backend::{LocalBackend, MockBackend};

    async fn fixture() -> (MockBackend, Repository) {
        let backend = MockBackend::with_files([
            ("Manga/Berserk/Volume 01.cbz", &b"0123"[..]),
            ("Manga/Berserk/Volume 02.cbz", &b"01234567"[..]),
            ("README.txt", &b"hello"[..]),
        ]);
        let records = Repository::from(&Database::connect_in_memory().await.unwrap());
        (backend, records)
    }

    #[tokio::test]
    async fn test_resolve_directory_creates_record() {
        let (backend, records) = fixture().await;
        let resolved = resolve(&backend, &records, "Manga/Berserk/").await.unwrap();
        assert_eq!(resolved.relative.as_str(), "/Manga/Berserk");
        assert!(!resolved.is_file());
        assert!(!resolved.is_root());
        assert_eq!(resolved.relative_top(), Some("Manga"));
        let record = resolved.record.clone().unwrap();
        assert_eq!(record.path_hash, resolved.hash);
        assert_eq!(records.get_by_hash(&resolved.hash).await.unwrap(), Some(record));

        let children = resolved.children(&backend).await.unwrap();
        assert_eq!(children.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_is_deterministic() {
        let (backend, records) = fixture().await;
        let first = resolve(&backend, &records, "/Manga/Berserk").await.unwrap();
        let second = resolve(&backend, &records, "Manga//./Berserk/").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.breadcrumbs(), second.breadcrumbs());
    }

    #[tokio::test]
    async fn test_resolve_file_has_no_record() {
        let (backend, records) = fixture().await;
        let resolved = resolve(&backend, &records, "/README.txt").await.unwrap();
        assert!(resolved.is_file());
        assert!(resolved.record.is_none());
        assert!(records.get_by_hash(&resolved.hash).await.unwrap().is_none());
        let err = resolved.children(&backend).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_resolve_root() {
        let (backend, records) = fixture().await;
        let resolved = resolve(&backend, &records, "").await.unwrap();
        assert!(resolved.is_root());
        assert_eq!(resolved.relative_top(), None);
        assert!(resolved.breadcrumbs().is_empty());
        assert!(resolved.record.is_some());
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("/Manga/../../secret")]
    #[case("a\0b")]
    #[tokio::test]
    async fn test_resolve_invalid(#[case] raw: &str) {
        let (backend, records) = fixture().await;
        let err = resolve(&backend, &records, raw).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_resolve_missing() {
        let (backend, records) = fixture().await;
        let err = resolve(&backend, &records, "/Manga/Vagabond").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[rstest]
    #[case("/README.txt/child")]
    #[case("/Manga/Berserk/Volume 01.cbz/page 1")]
    #[tokio::test]
    async fn test_resolve_below_a_file_on_disk(#[case] raw: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("Manga/Berserk")).unwrap();
        std::fs::write(temp_dir.path().join("Manga/Berserk/Volume 01.cbz"), b"0123").unwrap();
        std::fs::write(temp_dir.path().join("README.txt"), b"hello").unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        let records = Repository::from(&Database::connect_in_memory().await.unwrap());

        let err = resolve(&backend, &records, raw).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
