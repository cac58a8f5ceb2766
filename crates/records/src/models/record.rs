use super::timestamp;
use crate::error::{Error, ErrorKind};
use crate::{RecordId, SeriesId};
use exn::ResultExt;
use serde::Serialize;
use time::OffsetDateTime;
use trove_storage::PathHash;

/// User-editable metadata attached to a single directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRecord {
    pub id: RecordId,
    pub path_hash: PathHash,
    /// Linked series in the external catalog, if any.
    pub series_id: Option<SeriesId>,
    pub incomplete: bool,
    /// Only privileged users may change this; locked records cannot be reported.
    pub locked: bool,
    pub comment: Option<String>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct RecordRow {
    id: i64,
    path_hash: String,
    series_id: Option<i64>,
    incomplete: bool,
    locked: bool,
    comment: Option<String>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<RecordRow> for PathRecord {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            path_hash: row.path_hash.parse::<PathHash>().or_raise(|| ErrorKind::InvalidData("path hash"))?,
            series_id: row.series_id,
            incomplete: row.incomplete,
            locked: row.locked,
            comment: row.comment,
            created_at: timestamp(row.created_at, "created at")?,
            updated_at: timestamp(row.updated_at, "updated at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trove_storage::RelativePath;

    fn row(path_hash: &str) -> RecordRow {
        RecordRow {
            id: 7,
            path_hash: path_hash.to_string(),
            series_id: Some(42),
            incomplete: true,
            locked: false,
            comment: None,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_100,
        }
    }

    #[test]
    fn test_row_to_model() {
        let hash = PathHash::of(&RelativePath::parse("/Manga/Berserk").unwrap());
        let record = PathRecord::try_from(row(hash.as_str())).unwrap();
        assert_eq!(record.path_hash, hash);
        assert_eq!(record.series_id, Some(42));
        assert_eq!(record.updated_at.unix_timestamp(), 1_700_000_100);
    }

    #[test]
    fn test_corrupt_hash_is_invalid_data() {
        let err = PathRecord::try_from(row("not-a-hash")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("path hash")));
    }

    #[test]
    fn test_serializes_timestamps_as_seconds() {
        let hash = PathHash::of(&RelativePath::root());
        let record = PathRecord::try_from(row(hash.as_str())).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["created_at"], 1_700_000_000);
        assert_eq!(json["path_hash"], hash.as_str());
    }
}
