use super::timestamp;
use crate::error::Error;
use crate::{RecordId, UserId};
use serde::Serialize;
use time::OffsetDateTime;

/// A moderation report raised against a path record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub id: i64,
    pub path_record_id: RecordId,
    pub reason: String,
    /// Reporting user, `None` for anonymous reports.
    pub user_id: Option<UserId>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReportRow {
    id: i64,
    path_record_id: i64,
    reason: String,
    user_id: Option<i64>,
    created_at: i64,
}
impl TryFrom<ReportRow> for Report {
    type Error = Error;
    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            path_record_id: row.path_record_id,
            reason: row.reason,
            user_id: row.user_id,
            created_at: timestamp(row.created_at, "report date")?,
        })
    }
}
