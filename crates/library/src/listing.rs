//! The index view: a resolved path plus everything needed to render it.

use crate::catalog::{CatalogHandle, FacetType, GroupedStaff, Series, SeriesCatalog};
use crate::context::RequestContext;
use crate::error::{ErrorKind, Result};
use crate::export::{ExportCache, ExportedChild};
use crate::resolve::{ResolvedPath, resolve};
use crate::sort::{OrderDirection, OrderMethod, SortOrder};
use exn::ResultExt;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use trove_records::{Repository, SeriesId};
use trove_storage::{BackendHandle, Breadcrumb};

/// Raw `order` and `dir` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub order: Option<String>,
    pub dir: Option<String>,
}
impl ListingQuery {
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_query(self.order.as_deref(), self.dir.as_deref())
    }
}

/// Catalog data shown for a directory linked to a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesOverlay {
    pub series: Series,
    pub grouped_staff: GroupedStaff,
    pub genres: Vec<String>,
    pub categories: Vec<String>,
    pub related: Vec<Series>,
    /// `None` for anonymous visitors.
    pub user_is_watching: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub path: ResolvedPath,
    pub is_root: bool,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub children: Vec<ExportedChild>,
    pub order: OrderMethod,
    pub dir: OrderDirection,
    pub inverse_dir: OrderDirection,
    pub page_title: Option<String>,
    pub series: Option<SeriesOverlay>,
}

/// Outcome of browsing a path: files are handed back for the caller to
/// stream, directories get a full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Browse {
    File(ResolvedPath),
    Directory(Box<Listing>),
}

/// Entry point for browsing the archive and editing its metadata.
///
/// Cheap to clone; clones share the same export cache.
#[derive(Clone)]
pub struct Browser {
    pub(crate) backend: BackendHandle,
    pub(crate) records: Repository,
    pub(crate) catalog: CatalogHandle,
    pub(crate) exports: Arc<ExportCache>,
}

impl Browser {
    pub fn new(backend: BackendHandle, records: Repository, catalog: CatalogHandle) -> Self {
        Self { backend, records, catalog, exports: Arc::new(ExportCache::new()) }
    }

    /// Share an existing export cache instead of starting with an empty one.
    pub fn with_export_cache(mut self, exports: Arc<ExportCache>) -> Self {
        self.exports = exports;
        self
    }

    pub fn exports(&self) -> &ExportCache {
        &self.exports
    }

    pub fn records(&self) -> &Repository {
        &self.records
    }

    pub async fn resolve(&self, raw: &str) -> Result<ResolvedPath> {
        resolve(self.backend.as_ref(), &self.records, raw).await
    }

    #[instrument(skip(self, ctx), fields(backend = self.backend.name()))]
    pub async fn browse(&self, ctx: &RequestContext, raw: &str, query: &ListingQuery) -> Result<Browse> {
        let path = self.resolve(raw).await?;
        if path.is_file() {
            return Ok(Browse::File(path));
        }

        let entries = path.children(self.backend.as_ref()).await?;
        let children = try_join_all(entries.iter().map(|info| self.exports.get_or_export(info, &self.records))).await?;
        let sort = query.sort_order();
        let children = sort.apply(children);

        let series_id = path.record.as_ref().and_then(|record| record.series_id);
        let series = match series_id {
            Some(id) => self.overlay(ctx, id).await?,
            None => None,
        };
        let page_title = match &series {
            Some(overlay) => Some(overlay.series.name.clone()),
            None => path.relative_top().map(str::to_string),
        };
        tracing::debug!(children = children.len(), linked = series.is_some(), "built listing");

        Ok(Browse::Directory(Box::new(Listing {
            is_root: path.is_root(),
            breadcrumbs: path.breadcrumbs(),
            path,
            children,
            order: sort.method,
            dir: sort.direction,
            inverse_dir: sort.direction.inverse(),
            page_title,
            series,
        })))
    }

    /// `None` when the linked series no longer exists in the catalog, in
    /// which case the directory renders as if it were unlinked.
    async fn overlay(&self, ctx: &RequestContext, id: SeriesId) -> Result<Option<SeriesOverlay>> {
        let catalog: &dyn SeriesCatalog = self.catalog.as_ref();
        let Some(series) = catalog.get(id).await.or_raise(|| ErrorKind::Catalog)? else {
            tracing::warn!(series_id = id, "record links to a series missing from the catalog");
            return Ok(None);
        };
        let (grouped_staff, genres, categories, related) = futures::try_join!(
            catalog.grouped_staff(id),
            catalog.facet_names(id, FacetType::Genre),
            catalog.facet_names(id, FacetType::Category),
            catalog.related(id),
        )
        .or_raise(|| ErrorKind::Catalog)?;
        let user_is_watching = ctx.principal().map(|principal| principal.is_watching_series(id));
        Ok(Some(SeriesOverlay { series, grouped_staff, genres, categories, related, user_is_watching }))
    }
}
