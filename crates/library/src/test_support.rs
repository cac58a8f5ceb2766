//! Shared fixtures for this crate's tests.

use crate::catalog::{CatalogEntry, FacetType, MemoryCatalog};
use crate::listing::Browser;
use std::sync::Arc;
use time::OffsetDateTime;
use trove_records::{Database, Repository};
use trove_storage::backend::MockBackend;
use trove_storage::RelativePath;

pub(crate) fn relative(raw: &str) -> RelativePath {
    RelativePath::parse(raw).unwrap()
}

pub(crate) fn catalog() -> MemoryCatalog {
    MemoryCatalog::new([
        CatalogEntry::new(1, "Berserk")
            .with_external_id("mu-1")
            .with_staff("Author", "Kentaro Miura")
            .with_facet(FacetType::Genre, "Action")
            .with_facet(FacetType::Category, "Dark Fantasy")
            .with_related(2),
        CatalogEntry::new(2, "Gigantomakhia").with_external_id("mu-2"),
    ])
}

/// Browser over a small archive:
///
/// ```text
/// /Anime/Cowboy Bebop/Session 1.mkv
/// /Manga/Berserk/Volume 01.cbz   (4 bytes)
/// /Manga/Berserk/Volume 02.cbz   (8 bytes)
/// /README.txt
/// ```
pub(crate) async fn browser() -> (Browser, Arc<MockBackend>) {
    browser_with_catalog(Arc::new(catalog())).await
}

pub(crate) async fn browser_with_catalog(catalog: Arc<MemoryCatalog>) -> (Browser, Arc<MockBackend>) {
    let backend = Arc::new(
        MockBackend::with_files([
            ("Anime/Cowboy Bebop/Session 1.mkv", &b"session"[..]),
            ("Manga/Berserk/Volume 01.cbz", &b"0123"[..]),
            ("Manga/Berserk/Volume 02.cbz", &b"01234567"[..]),
        ])
        .with_file("README.txt", b"hello".to_vec(), OffsetDateTime::UNIX_EPOCH),
    );
    let records = Repository::from(&Database::connect_in_memory().await.unwrap());
    let browser = Browser::new(backend.clone(), records, catalog);
    (browser, backend)
}
