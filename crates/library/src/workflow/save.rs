use super::flash_outcome;
use crate::context::RequestContext;
use crate::error::{ErrorKind, Result};
use crate::listing::Browser;
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use trove_records::{PathRecord, RecordId};

/// Submitted fields of the record edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SaveForm {
    /// Unlink the series. Nothing else is changed when set.
    pub delete: bool,
    /// Refresh the linked series from the external source.
    pub update: bool,
    /// Link the series with this external (MangaUpdates) id.
    #[serde(rename = "mu_id")]
    pub external_id: Option<String>,
    pub incomplete: bool,
    /// Ignored unless the user has elevated privilege.
    pub locked: bool,
    pub comment: Option<String>,
}
impl SaveForm {
    fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    fn comment(&self) -> Option<String> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty()).map(str::to_string)
    }
}

impl Browser {
    /// Apply an edit to a path record.
    ///
    /// Exactly one of three branches runs: `delete` unlinks the series;
    /// otherwise `update` refreshes the linked series, or a non-blank
    /// `external_id` links a new one. Outside the `delete` branch the
    /// `incomplete` flag and comment are always written, and `locked` is
    /// written only for privileged users. The stored record's export snapshot
    /// is evicted afterwards.
    ///
    /// # Errors
    /// - [`NotFound`](ErrorKind::NotFound) if the record doesn't exist,
    /// - [`ExternalLookup`](ErrorKind::ExternalLookup) if the external id
    ///   can't be resolved (nothing is persisted),
    /// - [`Catalog`](ErrorKind::Catalog) if a refresh fails,
    /// - [`Records`](ErrorKind::Records) if the store fails.
    #[instrument(skip(self, ctx), fields(user = ?ctx.user_id()))]
    pub async fn save(&self, ctx: &mut RequestContext, record_id: RecordId, form: SaveForm) -> Result<PathRecord> {
        let outcome = self.apply_save(ctx, record_id, &form).await;
        flash_outcome(ctx, &outcome, "Saved path details successfully");
        outcome
    }

    async fn apply_save(&self, ctx: &RequestContext, record_id: RecordId, form: &SaveForm) -> Result<PathRecord> {
        let mut record = self
            .records
            .get(record_id)
            .await
            .or_raise(|| ErrorKind::Records)?
            .ok_or_raise(|| ErrorKind::NotFound(format!("path record {record_id}")))?;

        if form.delete {
            record.series_id = None;
        } else {
            if form.update {
                if let Some(series_id) = record.series_id {
                    self.catalog.refresh(series_id).await.or_raise(|| ErrorKind::Catalog)?;
                }
            } else if let Some(external_id) = form.external_id() {
                let lookup = ErrorKind::ExternalLookup(external_id.to_string());
                let series = match self.catalog.get_or_create_from_external_id(external_id).await {
                    Ok(Some(series)) => series,
                    Ok(None) => exn::bail!(lookup),
                    Err(e) => return Err(e).or_raise(|| lookup),
                };
                record.series_id = Some(series.id);
            }

            record.incomplete = form.incomplete;
            record.comment = form.comment();
            if ctx.is_elevated() {
                record.locked = form.locked;
            } else if form.locked != record.locked {
                debug!(record_id, "ignoring lock change from unprivileged user");
            }
        }

        let saved = self.records.update(&record).await.or_raise(|| ErrorKind::Records)?;
        let evicted = self.exports.invalidate(&saved.path_hash);
        info!(record_id, series_id = ?saved.series_id, evicted, "saved path record");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FlashLevel, User};
    use crate::test_support::browser;
    use std::sync::Arc;
    use trove_storage::RelativePath;

    async fn record(browser: &Browser, raw: &str) -> PathRecord {
        browser.resolve(raw).await.unwrap().record.unwrap()
    }

    fn elevated() -> RequestContext {
        RequestContext::authenticated(Arc::new(User::new(1).elevated()))
    }

    #[tokio::test]
    async fn test_link_by_external_id() {
        let (browser, _) = browser().await;
        let record = record(&browser, "/Manga/Berserk").await;
        let mut ctx = RequestContext::anonymous();
        let form = SaveForm {
            external_id: Some(" mu-1 ".to_string()),
            incomplete: true,
            comment: Some("missing extras".to_string()),
            ..SaveForm::default()
        };
        let saved = browser.save(&mut ctx, record.id, form).await.unwrap();
        assert_eq!(saved.series_id, Some(1));
        assert!(saved.incomplete);
        assert_eq!(saved.comment.as_deref(), Some("missing extras"));
        assert_eq!(ctx.flashes()[0].level, FlashLevel::Success);
        assert_eq!(ctx.flashes()[0].message, "Saved path details successfully");
    }

    #[tokio::test]
    async fn test_unknown_external_id_persists_nothing() {
        let (browser, _) = browser().await;
        let record = record(&browser, "/Manga/Berserk").await;
        let mut ctx = RequestContext::anonymous();
        let form = SaveForm { external_id: Some("mu-404".to_string()), incomplete: true, ..SaveForm::default() };
        let err = browser.save(&mut ctx, record.id, form).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ExternalLookup(id) if id == "mu-404"));
        assert_eq!(ctx.flashes()[0].level, FlashLevel::Error);
        assert_eq!(ctx.flashes()[0].message, "Failed to find series for MU ID");
        assert_eq!(browser.records().get(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_delete_only_unlinks() {
        let (browser, _) = browser().await;
        let mut record = record(&browser, "/Manga/Berserk").await;
        record.series_id = Some(1);
        record.incomplete = true;
        record.comment = Some("keep me".to_string());
        browser.records().update(&record).await.unwrap();

        let mut ctx = elevated();
        // Everything besides `delete` is ignored in this branch.
        let form = SaveForm { delete: true, incomplete: false, locked: true, comment: None, ..SaveForm::default() };
        let saved = browser.save(&mut ctx, record.id, form).await.unwrap();
        assert_eq!(saved.series_id, None);
        assert!(saved.incomplete);
        assert!(!saved.locked);
        assert_eq!(saved.comment.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_update_refreshes_linked_series() {
        let catalog = Arc::new(crate::test_support::catalog());
        let (browser, _) = crate::test_support::browser_with_catalog(catalog.clone()).await;
        let mut record = record(&browser, "/Manga/Berserk").await;
        record.series_id = Some(1);
        browser.records().update(&record).await.unwrap();

        let mut ctx = RequestContext::anonymous();
        let form = SaveForm { update: true, external_id: Some("mu-2".to_string()), ..SaveForm::default() };
        let saved = browser.save(&mut ctx, record.id, form).await.unwrap();
        assert_eq!(catalog.refresh_count(1).await, 1);
        // `update` wins over a submitted external id.
        assert_eq!(saved.series_id, Some(1));
    }

    #[tokio::test]
    async fn test_lock_requires_privilege() {
        let (browser, _) = browser().await;
        let record = record(&browser, "/Manga/Berserk").await;

        let mut ctx = RequestContext::authenticated(Arc::new(User::new(2)));
        let saved = browser.save(&mut ctx, record.id, SaveForm { locked: true, ..SaveForm::default() }).await.unwrap();
        assert!(!saved.locked);

        let mut ctx = elevated();
        let saved = browser.save(&mut ctx, record.id, SaveForm { locked: true, ..SaveForm::default() }).await.unwrap();
        assert!(saved.locked);
    }

    #[tokio::test]
    async fn test_missing_record() {
        let (browser, _) = browser().await;
        let mut ctx = RequestContext::anonymous();
        let err = browser.save(&mut ctx, 404, SaveForm::default()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(ctx.flashes().is_empty());
    }

    #[tokio::test]
    async fn test_save_evicts_export_snapshot() {
        let (browser, _) = browser().await;
        let ctx = RequestContext::anonymous();
        browser.browse(&ctx, "/Manga", &Default::default()).await.unwrap();
        let berserk: RelativePath = "/Manga/Berserk".parse().unwrap();
        assert!(browser.exports().contains(&berserk));

        let record = record(&browser, "/Manga/Berserk").await;
        let mut ctx = RequestContext::anonymous();
        browser.save(&mut ctx, record.id, SaveForm { incomplete: true, ..SaveForm::default() }).await.unwrap();
        assert!(!browser.exports().contains(&berserk));
    }

    #[test]
    fn test_form_deserializes_with_defaults() {
        let form: SaveForm = serde_json::from_str(r#"{"mu_id": "mu-1", "incomplete": true}"#).unwrap();
        assert_eq!(form.external_id(), Some("mu-1"));
        assert!(form.incomplete);
        assert!(!form.delete);
        let blank = SaveForm { external_id: Some("  ".to_string()), comment: Some(" ".to_string()), ..SaveForm::default() };
        assert_eq!(blank.external_id(), None);
        assert_eq!(blank.comment(), None);
    }
}
