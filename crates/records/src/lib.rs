//! SQLite store for the metadata overlay.
//!
//! The archive on disk is the source of truth for *what exists*; this store
//! only holds what users attach to it. Each browsed directory owns exactly one
//! [`PathRecord`], keyed by the [`PathHash`](trove_storage::PathHash) of its
//! canonical path, and each record can carry at most one open [`Report`].
//!
//! Records are created lazily (get-or-create on first resolution) and are
//! never deleted by the browser. Unlinking a series only clears the link.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{PathRecord, Report};
pub use crate::repo::Repository;

/// Store-assigned identifier of a [`PathRecord`].
pub type RecordId = i64;
/// Identifier of a series in the external catalog.
pub type SeriesId = i64;
/// Identifier of a user in the external auth system.
pub type UserId = i64;
