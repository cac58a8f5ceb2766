//! Repository for path records and their reports.
//!
//! The two are tightly coupled: a report can't exist without the record it
//! points at, and reporting rules depend on the record's state.

use crate::error::{ErrorKind, Result};
use crate::models::{RecordRow, ReportRow};
use crate::{Database, PathRecord, RecordId, Report, UserId};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::instrument;
use trove_storage::PathHash;

/// Repository for managing path records and reports in the store.
///
/// # Relationships
///
/// - Exactly one record per path hash, created on first access
/// - At most one open report per record
/// - Deleting a record cascades to its report (never done by the browser)
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    // =========================================================================
    // Path Records
    // =========================================================================

    /// Get a record by its store-assigned identifier.
    pub async fn get(&self, id: RecordId) -> Result<Option<PathRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_record.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PathRecord::try_from).transpose()
    }

    /// Get a record by path hash, without creating one.
    ///
    /// Used when exporting children: listing a directory must not create
    /// records for every child it shows.
    pub async fn get_by_hash(&self, hash: &PathHash) -> Result<Option<PathRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_record_by_hash.sql"))
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PathRecord::try_from).transpose()
    }

    /// Get the record for a path hash, creating an empty one if none exists.
    ///
    /// A single upsert statement, so two concurrent first visits to the same
    /// directory still end up sharing one record.
    #[instrument(level = "debug", skip(self), fields(hash = %hash))]
    pub async fn get_or_create(&self, hash: &PathHash) -> Result<PathRecord> {
        let row: RecordRow = sqlx::query_as(include_str!("../queries/get_or_create_record.sql"))
            .bind(hash.as_str())
            .bind(Self::now())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    /// Persist the editable fields of a record in one statement.
    ///
    /// Writes `series_id`, `incomplete`, `locked` and `comment`, bumps
    /// `updated_at` and returns the stored result. The path hash and creation
    /// date are never changed.
    #[instrument(level = "debug", skip_all, fields(id = record.id))]
    pub async fn update(&self, record: &PathRecord) -> Result<PathRecord> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/update_record.sql"))
            .bind(record.id)
            .bind(record.series_id)
            .bind(record.incomplete)
            .bind(record.locked)
            .bind(record.comment.as_deref())
            .bind(Self::now())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.ok_or_raise(|| ErrorKind::RecordNotFound(record.id))?.try_into()
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Get the open report for a record, if any.
    pub async fn get_report(&self, record_id: RecordId) -> Result<Option<Report>> {
        let row: Option<ReportRow> = sqlx::query_as(include_str!("../queries/get_report.sql"))
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Report::try_from).transpose()
    }

    /// Open a report against a record.
    ///
    /// The insert is a single statement that only succeeds for an existing,
    /// unlocked record, so concurrent reporters are serialized by SQLite and
    /// the losers trip the unique constraint. Rejections are reported as:
    /// 1. [`AlreadyReported`](ErrorKind::AlreadyReported) if a report exists,
    /// 2. [`RecordNotFound`](ErrorKind::RecordNotFound) if the record is missing,
    /// 3. [`Locked`](ErrorKind::Locked) if the record is locked.
    ///
    /// Reason validation is the caller's job; the schema only rejects blank
    /// reasons as a last resort.
    #[instrument(level = "debug", skip(self, reason))]
    pub async fn create_report(&self, record_id: RecordId, reason: &str, user_id: Option<UserId>) -> Result<Report> {
        let inserted: std::result::Result<Option<ReportRow>, sqlx::Error> =
            sqlx::query_as(include_str!("../queries/insert_report.sql"))
                .bind(record_id)
                .bind(reason)
                .bind(user_id)
                .bind(Self::now())
                .fetch_optional(&self.pool)
                .await;
        match inserted {
            Ok(Some(row)) => row.try_into(),
            Ok(None) => exn::bail!(self.rejection(record_id).await?),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                exn::bail!(ErrorKind::AlreadyReported(record_id))
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Database),
        }
    }

    /// Work out why the guarded insert matched no record.
    async fn rejection(&self, record_id: RecordId) -> Result<ErrorKind> {
        if self.get_report(record_id).await?.is_some() {
            return Ok(ErrorKind::AlreadyReported(record_id));
        }
        Ok(match self.get(record_id).await? {
            None => ErrorKind::RecordNotFound(record_id),
            Some(_) => ErrorKind::Locked(record_id),
        })
    }

    /// Remove the open report for a record.
    ///
    /// Returns `false` if there was nothing to clear.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear_report(&self, record_id: RecordId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_report.sql"))
            .bind(record_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
