//! Storage layer for the archive: canonical relative paths, stable path
//! hashes, and read-only filesystem backends that list directories in the
//! order the browser expects.

pub mod backend;
pub mod error;
mod hash;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::hash::PathHash;
pub use crate::models::{EntryInfo, EntryKind, compare_names};
pub use crate::path::{Breadcrumb, RelativePath, SEPARATOR};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
