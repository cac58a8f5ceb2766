//! Storage models.
//!
//! These types describe what a backend knows about a single filesystem
//! entry, independent of any metadata attached to it elsewhere.

use crate::path::RelativePath;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}
impl EntryKind {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Entry metadata returned by storage backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Canonical path from the archive root
    pub path: RelativePath,
    pub kind: EntryKind,
    /// Size in bytes (as reported by the filesystem for directories)
    pub size: u64,
    /// Last modified timestamp
    #[serde(with = "time::serde::timestamp")]
    pub modified: OffsetDateTime,
}
impl EntryInfo {
    pub fn new(path: RelativePath, kind: EntryKind, size: u64, modified: OffsetDateTime) -> Self {
        Self { path, kind, size, modified }
    }

    /// Final path segment; empty for the archive root.
    pub fn name(&self) -> &str {
        self.path.name().unwrap_or_default()
    }
}

/// The ordering every backend lists children in.
///
/// Case-insensitive first so `anime` and `Anime` sit together, then by raw
/// bytes so the order is total and two names only compare equal when they
/// are identical.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}
