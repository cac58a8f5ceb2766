use super::flash_outcome;
use crate::context::RequestContext;
use crate::error::{ErrorKind, Result, ValidationError};
use crate::listing::Browser;
use exn::ResultExt;
use std::ops::Deref;
use tracing::{info, instrument, warn};
use trove_records::error::ErrorKind as RecordsErrorKind;
use trove_records::{RecordId, Report};

impl Browser {
    /// Report a path record for moderation.
    ///
    /// The report is attributed to the current principal, if any.
    ///
    /// # Errors
    /// - [`Validation`](ErrorKind::Validation) for a blank reason, an existing
    ///   report, or a locked record,
    /// - [`NotFound`](ErrorKind::NotFound) if the record doesn't exist.
    #[instrument(skip(self, ctx, reason), fields(user = ?ctx.user_id()))]
    pub async fn report(&self, ctx: &mut RequestContext, record_id: RecordId, reason: &str) -> Result<Report> {
        let outcome = self.file_report(ctx, record_id, reason).await;
        flash_outcome(ctx, &outcome, "Report submitted");
        outcome
    }

    async fn file_report(&self, ctx: &RequestContext, record_id: RecordId, reason: &str) -> Result<Report> {
        let reason = reason.trim();
        if reason.is_empty() {
            exn::bail!(ErrorKind::Validation(ValidationError::ReasonRequired));
        }
        match self.records.create_report(record_id, reason, ctx.user_id()).await {
            Ok(report) => {
                info!(record_id, "report submitted");
                Ok(report)
            },
            Err(e) => {
                let kind = match e.deref() {
                    RecordsErrorKind::AlreadyReported(_) => ErrorKind::Validation(ValidationError::AlreadyReported),
                    RecordsErrorKind::Locked(_) => ErrorKind::Validation(ValidationError::Locked),
                    RecordsErrorKind::RecordNotFound(_) => ErrorKind::NotFound(format!("path record {record_id}")),
                    _ => ErrorKind::Records,
                };
                warn!(record_id, reason = %kind, "report rejected");
                Err(e).or_raise(|| kind)
            },
        }
    }

    /// Close the open report on a record. Returns `false` if there was none.
    #[instrument(skip(self))]
    pub async fn clear_report(&self, record_id: RecordId) -> Result<bool> {
        let cleared = self.records.clear_report(record_id).await.or_raise(|| ErrorKind::Records)?;
        info!(record_id, cleared, "cleared report");
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FlashLevel, User};
    use crate::test_support::browser;
    use rstest::rstest;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_report_success() {
        let (browser, _) = browser().await;
        let record = browser.resolve("/Manga/Berserk").await.unwrap().record.unwrap();
        let mut ctx = RequestContext::authenticated(Arc::new(User::new(12)));
        let report = browser.report(&mut ctx, record.id, "  wrong series  ").await.unwrap();
        assert_eq!(report.reason, "wrong series");
        assert_eq!(report.user_id, Some(12));
        assert_eq!(ctx.flashes()[0].level, FlashLevel::Success);
        assert_eq!(ctx.flashes()[0].message, "Report submitted");
    }

    #[tokio::test]
    async fn test_anonymous_report() {
        let (browser, _) = browser().await;
        let record = browser.resolve("/Anime").await.unwrap().record.unwrap();
        let mut ctx = RequestContext::anonymous();
        let report = browser.report(&mut ctx, record.id, "duplicate").await.unwrap();
        assert_eq!(report.user_id, None);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn test_reason_required(#[case] reason: &str) {
        let (browser, _) = browser().await;
        let record = browser.resolve("/Anime").await.unwrap().record.unwrap();
        let mut ctx = RequestContext::anonymous();
        let err = browser.report(&mut ctx, record.id, reason).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(ValidationError::ReasonRequired)));
        assert_eq!(ctx.flashes()[0].message, "Please enter a report reason!");
    }

    #[tokio::test]
    async fn test_duplicate_report() {
        let (browser, _) = browser().await;
        let record = browser.resolve("/Anime").await.unwrap().record.unwrap();
        let mut ctx = RequestContext::anonymous();
        browser.report(&mut ctx, record.id, "first").await.unwrap();
        let err = browser.report(&mut ctx, record.id, "second").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(ValidationError::AlreadyReported)));
        assert_eq!(ctx.flashes()[1].message, "This path has already been reported");
    }

    #[tokio::test]
    async fn test_locked_record() {
        let (browser, _) = browser().await;
        let mut record = browser.resolve("/Anime").await.unwrap().record.unwrap();
        record.locked = true;
        browser.records().update(&record).await.unwrap();
        let mut ctx = RequestContext::anonymous();
        let err = browser.report(&mut ctx, record.id, "reason").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(ValidationError::Locked)));
        assert_eq!(ctx.flashes()[0].message, "You cannot report this directory!");
    }

    #[tokio::test]
    async fn test_missing_record() {
        let (browser, _) = browser().await;
        let mut ctx = RequestContext::anonymous();
        let err = browser.report(&mut ctx, 404, "reason").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(ctx.flashes().is_empty());
    }

    #[tokio::test]
    async fn test_clear_report() {
        let (browser, _) = browser().await;
        let record = browser.resolve("/Anime").await.unwrap().record.unwrap();
        let mut ctx = RequestContext::anonymous();
        browser.report(&mut ctx, record.id, "reason").await.unwrap();
        assert!(browser.clear_report(record.id).await.unwrap());
        assert!(!browser.clear_report(record.id).await.unwrap());
        browser.report(&mut ctx, record.id, "again").await.unwrap();
    }
}
