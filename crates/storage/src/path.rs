//! Canonical relative paths and path traversal protection.
//!
//! Every path the browser deals with is a [`RelativePath`]: a URL-style
//! string that always starts with [`SEPARATOR`], never contains `.` or empty
//! segments, and can never point above the archive root.

use crate::error::{ErrorKind, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Separator between segments, and the canonical form of the root itself.
pub const SEPARATOR: &str = "/";

/// A normalized, root-anchored path inside the archive.
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use trove_storage::RelativePath;
/// // Valid paths
/// assert!(RelativePath::parse("Anime/Cowboy Bebop").is_ok());
/// assert!(RelativePath::parse("/a/../b").is_ok()); // (never leaves archive root)
/// assert!(RelativePath::parse("").unwrap().is_root());
/// // Invalid paths
/// assert!(RelativePath::parse("../etc/passwd").is_err());
/// assert!(RelativePath::parse("a/../../b").is_err()); // (leaves archive root)
/// assert!(RelativePath::parse("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     RelativePath::parse("wrong/../still-wrong/.././correct//./dir/").unwrap().as_str(),
///     "/correct/dir"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RelativePath(String);

/// One step of the navigation trail: the segment's display name and the
/// cumulative path leading up to and including it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: RelativePath,
}

impl RelativePath {
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    /// Normalizes raw request input into a canonical path.
    ///
    /// Leading/trailing/duplicate separators and `.` segments are dropped,
    /// `..` pops the previous segment. Returns
    /// [`InvalidPath`](crate::error::ErrorKind::InvalidPath) if a `..` would
    /// leave the root, or if the input contains null bytes.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        // Use Rust's built-in path component parser for robust handling.
        let mut segments: Vec<&str> = Vec::new();
        for component in Path::new(raw).components() {
            match component {
                Component::Normal(s) => {
                    // Null bytes pass through Path::components() on Unix but cause
                    // truncation in C-based syscalls.
                    if s.as_encoded_bytes().contains(&0) {
                        exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
                    }
                    // Components of a &str are always valid UTF-8.
                    let Some(s) = s.to_str() else {
                        exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
                    };
                    segments.push(s);
                },
                Component::CurDir | Component::RootDir => {},
                Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(raw.to_string())),
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
                    }
                },
            }
        }
        Ok(Self::from_segments(segments))
    }

    fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut canonical = String::new();
        for segment in segments {
            canonical.push_str(SEPARATOR);
            canonical.push_str(segment);
        }
        match canonical.is_empty() {
            true => Self::root(),
            false => Self(canonical),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == SEPARATOR
    }

    /// Segments after the root, in order. Empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Final segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// First segment after the root, `None` for the root.
    pub fn top(&self) -> Option<&str> {
        self.segments().next()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let count = self.segments().count();
        Some(Self::from_segments(self.segments().take(count - 1)))
    }

    /// Appends a single child segment.
    ///
    /// The name must be exactly one normal segment: no separators, no `.` or
    /// `..`, no null bytes.
    pub fn join(&self, name: &str) -> Result<Self> {
        if name.is_empty() || name == "." || name == ".." || name.contains(SEPARATOR) || name.contains('\0') {
            exn::bail!(ErrorKind::InvalidPath(format!("{}{SEPARATOR}{name}", self.0.trim_end_matches(SEPARATOR))));
        }
        Ok(Self::from_segments(self.segments().chain(std::iter::once(name))))
    }

    /// Navigation trail from the top-most segment down to this path.
    ///
    /// The root itself never appears: decomposing the root yields an empty
    /// trail, and `/a/b` yields `[("a", "/a"), ("b", "/a/b")]`.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut cumulative = String::new();
        self.segments()
            .map(|segment| {
                cumulative.push_str(SEPARATOR);
                cumulative.push_str(segment);
                Breadcrumb {
                    name: segment.to_string(),
                    path: Self(cumulative.clone()),
                }
            })
            .collect()
    }

    /// Path relative to a backend root directory (no leading separator,
    /// empty for the root).
    pub fn to_storage_path(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl Default for RelativePath {
    fn default() -> Self {
        Self::root()
    }
}
impl FromStr for RelativePath {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
