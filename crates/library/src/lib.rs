//! Path resolution and the metadata overlay for the archive browser.
//!
//! A request path is resolved against a [`StorageBackend`](trove_storage::StorageBackend)
//! into a [`ResolvedPath`]; directories are given a [`PathRecord`](trove_records::PathRecord)
//! on first sight. Listings are built from memoized [`ExportedChild`] snapshots,
//! ordered by a [`SortOrder`], and decorated with series data from a
//! [`SeriesCatalog`] when the directory is linked to one.
//!
//! The primary entry point is [`Browser`].

pub mod cache;
pub mod catalog;
pub mod context;
pub mod error;
pub mod export;
mod listing;
mod resolve;
pub mod sort;
#[cfg(test)]
mod test_support;
mod workflow;

pub use crate::catalog::{CatalogHandle, MemoryCatalog, SeriesCatalog};
pub use crate::context::{Flash, FlashLevel, Principal, RequestContext, User};
pub use crate::export::{ExportCache, ExportedChild, PATHS_TAG};
pub use crate::listing::{Browse, Browser, Listing, ListingQuery, SeriesOverlay};
pub use crate::resolve::{ResolvedPath, resolve};
pub use crate::sort::SortOrder;
pub use crate::workflow::SaveForm;
