//! Seam to the external series catalog.
//!
//! The catalog owns everything about a series (names, staff, genres, links to
//! the external MangaUpdates database). The browser only reads from it, plus
//! two write-ish calls used by the save workflow: refreshing a series from the
//! external source and resolving an external id into a local series.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use trove_records::SeriesId;

/// Staff names grouped by role (e.g. `"Author" => ["Kentaro Miura"]`).
pub type GroupedStaff = BTreeMap<String, Vec<String>>;
pub type CatalogHandle = Arc<dyn SeriesCatalog>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub name: String,
    /// Identifier in the external (MangaUpdates) database.
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetType {
    #[display("genre")]
    Genre,
    #[display("category")]
    Category,
}

/// Read access to the series catalog.
#[async_trait]
pub trait SeriesCatalog: Send + Sync {
    async fn get(&self, id: SeriesId) -> Result<Option<Series>>;

    async fn grouped_staff(&self, id: SeriesId) -> Result<GroupedStaff>;

    async fn facet_names(&self, id: SeriesId, facet: FacetType) -> Result<Vec<String>>;

    async fn related(&self, id: SeriesId) -> Result<Vec<Series>>;

    /// Re-download the series' data from the external source.
    async fn refresh(&self, id: SeriesId) -> Result<()>;

    /// Find the local series for an external id, importing it if the
    /// implementation is able to. `None` when the id is unknown.
    async fn get_or_create_from_external_id(&self, external_id: &str) -> Result<Option<Series>>;
}

/// A single series as stored by [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub series: Series,
    #[serde(default)]
    pub staff: GroupedStaff,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub related: Vec<SeriesId>,
}
impl CatalogEntry {
    pub fn new(id: SeriesId, name: impl Into<String>) -> Self {
        Self {
            series: Series { id, name: name.into(), external_id: None },
            staff: GroupedStaff::new(),
            genres: Vec::new(),
            categories: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.series.external_id = Some(external_id.into());
        self
    }

    pub fn with_staff(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.staff.entry(role.into()).or_default().push(name.into());
        self
    }

    pub fn with_facet(mut self, facet: FacetType, name: impl Into<String>) -> Self {
        match facet {
            FacetType::Genre => self.genres.push(name.into()),
            FacetType::Category => self.categories.push(name.into()),
        }
        self
    }

    pub fn with_related(mut self, id: SeriesId) -> Self {
        self.related.push(id);
        self
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    series: Vec<CatalogEntry>,
}

/// Catalog held entirely in memory, optionally loaded from a JSON file.
///
/// There is no external source behind it: [`refresh`](SeriesCatalog::refresh)
/// only counts calls, and unknown external ids resolve to `None`.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: RwLock<BTreeMap<SeriesId, CatalogEntry>>,
    refreshes: RwLock<HashMap<SeriesId, usize>>,
}
impl MemoryCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().map(|e| (e.series.id, e)).collect()),
            refreshes: RwLock::default(),
        }
    }

    /// Load a catalog from a JSON file of the form `{"series": [...]}`.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await.or_raise(|| ErrorKind::Catalog)?;
        let file: CatalogFile = serde_json::from_str(&raw).or_raise(|| ErrorKind::Catalog)?;
        tracing::debug!(series = file.series.len(), "loaded series catalog");
        Ok(Self::new(file.series))
    }

    /// How many times a series has been refreshed.
    pub async fn refresh_count(&self, id: SeriesId) -> usize {
        self.refreshes.read().await.get(&id).copied().unwrap_or_default()
    }

    async fn entry(&self, id: SeriesId) -> Result<CatalogEntry> {
        self.entries.read().await.get(&id).cloned().ok_or_raise(|| ErrorKind::Catalog)
    }
}

#[async_trait]
impl SeriesCatalog for MemoryCatalog {
    async fn get(&self, id: SeriesId) -> Result<Option<Series>> {
        Ok(self.entries.read().await.get(&id).map(|e| e.series.clone()))
    }

    async fn grouped_staff(&self, id: SeriesId) -> Result<GroupedStaff> {
        Ok(self.entry(id).await?.staff)
    }

    async fn facet_names(&self, id: SeriesId, facet: FacetType) -> Result<Vec<String>> {
        let entry = self.entry(id).await?;
        Ok(match facet {
            FacetType::Genre => entry.genres,
            FacetType::Category => entry.categories,
        })
    }

    async fn related(&self, id: SeriesId) -> Result<Vec<Series>> {
        let related = self.entry(id).await?.related;
        let entries = self.entries.read().await;
        // Dangling links are dropped rather than failing the whole page.
        Ok(related.iter().filter_map(|id| entries.get(id)).map(|e| e.series.clone()).collect())
    }

    async fn refresh(&self, id: SeriesId) -> Result<()> {
        self.entry(id).await?;
        *self.refreshes.write().await.entry(id).or_default() += 1;
        Ok(())
    }

    async fn get_or_create_from_external_id(&self, external_id: &str) -> Result<Option<Series>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| e.series.external_id.as_deref() == Some(external_id))
            .map(|e| e.series.clone()))
    }
}
