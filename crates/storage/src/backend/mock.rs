//! In-memory storage backend for testing.

use crate::error::{ErrorKind, Result};
use crate::models::{EntryInfo, EntryKind, compare_names};
use crate::{RelativePath, StorageBackend};
use async_trait::async_trait;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct MockEntry {
    kind: EntryKind,
    data: Vec<u8>,
    modified: OffsetDateTime,
}

/// In-memory storage backend for testing.
///
/// Entries are stored in a `BTreeMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Parent
/// directories of inserted files are created implicitly, and the root always
/// exists.
///
/// # Examples
///
/// ```
/// use trove_storage::{RelativePath, backend::{MockBackend, StorageBackend}};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("Anime/Cowboy Bebop/Session 1.mkv", b"..."),
/// ]);
/// assert!(backend.exists(&RelativePath::parse("Anime/Cowboy Bebop")?).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<RelativePath, MockEntry>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl AsRef<str>, impl Into<Vec<u8>>)>) -> Self {
        let backend = Self {
            name: "mock".to_string(),
            storage: RwLock::new(BTreeMap::new()),
        };
        files.into_iter().fold(backend, |backend, (path, data)| {
            backend.with_file(path, data, OffsetDateTime::UNIX_EPOCH)
        })
    }

    /// Add a file with an explicit modification time.
    ///
    /// Panics on invalid paths, same as [`with_files()`](Self::with_files).
    pub fn with_file(mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>, modified: OffsetDateTime) -> Self {
        let path = Self::validated(path.as_ref());
        Self::insert_into(self.storage.get_mut(), path, EntryKind::File, data.into(), modified);
        self
    }

    /// Add an empty directory.
    pub fn with_directory(mut self, path: impl AsRef<str>, modified: OffsetDateTime) -> Self {
        let path = Self::validated(path.as_ref());
        Self::insert_into(self.storage.get_mut(), path, EntryKind::Directory, Vec::new(), modified);
        self
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add or replace a file after construction.
    pub async fn insert(&self, path: &RelativePath, data: impl Into<Vec<u8>>) {
        let mut guard = self.storage.write().await;
        Self::insert_into(&mut guard, path.clone(), EntryKind::File, data.into(), OffsetDateTime::now_utc());
    }

    /// Remove an entry and everything beneath it.
    pub async fn remove(&self, path: &RelativePath) {
        let mut guard = self.storage.write().await;
        let prefix = format!("{path}/");
        guard.retain(|candidate, _| candidate != path && !candidate.as_str().starts_with(&prefix));
    }

    fn validated(raw: &str) -> RelativePath {
        match RelativePath::parse(raw) {
            Ok(path) if !path.is_root() => path,
            // The panic here is DELIBERATE. MockBackend is intended to be
            // used in tests; panics are expected. There is no error result.
            _ => panic!("MockBackend: invalid path {raw}"),
        }
    }

    fn insert_into(
        storage: &mut BTreeMap<RelativePath, MockEntry>,
        path: RelativePath,
        kind: EntryKind,
        data: Vec<u8>,
        modified: OffsetDateTime,
    ) {
        let mut parent = path.parent();
        while let Some(dir) = parent.filter(|dir| !dir.is_root()) {
            parent = dir.parent();
            storage.entry(dir).or_insert_with(|| MockEntry {
                kind: EntryKind::Directory,
                data: Vec::new(),
                modified,
            });
        }
        storage.insert(path, MockEntry { kind, data, modified });
    }

    fn info(path: &RelativePath, entry: &MockEntry) -> EntryInfo {
        EntryInfo::new(path.clone(), entry.kind, entry.data.len() as u64, entry.modified)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &[u8]); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &RelativePath) -> Result<bool> {
        Ok(path.is_root() || self.storage.read().await.contains_key(path))
    }

    async fn stat(&self, path: &RelativePath) -> Result<EntryInfo> {
        if path.is_root() {
            return Ok(EntryInfo::new(path.clone(), EntryKind::Directory, 0, OffsetDateTime::UNIX_EPOCH));
        }
        let guard = self.storage.read().await;
        let entry = guard.get(path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.to_string())))?;
        Ok(Self::info(path, entry))
    }

    async fn list_children(&self, path: &RelativePath) -> Result<Vec<EntryInfo>> {
        let guard = self.storage.read().await;
        if !path.is_root() {
            match guard.get(path) {
                None => exn::bail!(ErrorKind::NotFound(path.to_string())),
                Some(entry) if entry.kind.is_file() => exn::bail!(ErrorKind::NotADirectory(path.to_string())),
                Some(_) => {},
            }
        }
        let mut children: Vec<EntryInfo> = guard
            .iter()
            .filter(|(candidate, _)| candidate.parent().as_ref() == Some(path))
            .map(|(candidate, entry)| Self::info(candidate, entry))
            .collect();
        children.sort_by(|a, b| compare_names(a.name(), b.name()));
        Ok(children)
    }
}
