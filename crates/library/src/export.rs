//! Serializable snapshots of directory children, memoized per exact path.
//!
//! Snapshots are keyed by the exact-case path so that siblings differing
//! only in case each get their own entry. They are also filed under their
//! record's tag, which is derived from the case-folded [`PathHash`], so a
//! record change evicts every child linked to it.

use crate::cache::TaggedCache;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;
use trove_records::{PathRecord, RecordId, Repository, SeriesId};
use trove_storage::{EntryInfo, EntryKind, PathHash, RelativePath};

/// Tag every exported child is filed under.
pub const PATHS_TAG: &str = "paths";

/// The parts of a child directory's record shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub series_id: Option<SeriesId>,
    pub incomplete: bool,
    pub locked: bool,
}
impl From<&PathRecord> for RecordSummary {
    fn from(record: &PathRecord) -> Self {
        Self {
            id: record.id,
            series_id: record.series_id,
            incomplete: record.incomplete,
            locked: record.locked,
        }
    }
}

/// Immutable projection of one child entry, safe to share between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedChild {
    pub name: String,
    pub path: RelativePath,
    pub hash: PathHash,
    pub kind: EntryKind,
    pub size: u64,
    #[serde(with = "time::serde::timestamp")]
    pub modified: OffsetDateTime,
    /// Only directories that have been visited before carry a record.
    pub record: Option<RecordSummary>,
}
impl ExportedChild {
    pub fn new(info: &EntryInfo, hash: PathHash, record: Option<&PathRecord>) -> Self {
        Self {
            name: info.name().to_string(),
            path: info.path.clone(),
            hash,
            kind: info.kind,
            size: info.size,
            modified: info.modified,
            record: record.map(RecordSummary::from),
        }
    }
}

fn record_tag(hash: &PathHash) -> String {
    format!("record:{hash}")
}

/// Process-wide cache of [`ExportedChild`] values keyed by exact path.
#[derive(Default)]
pub struct ExportCache {
    inner: TaggedCache<ExportedChild>,
}
impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a child, or return the snapshot taken the first time it was seen.
    ///
    /// Directory children are enriched with their record if one exists. No
    /// record is created here: listing a directory must not create records
    /// for every child it shows.
    #[instrument(level = "trace", skip_all, fields(path = %info.path))]
    pub async fn get_or_export(&self, info: &EntryInfo, records: &Repository) -> Result<ExportedChild> {
        let hash = PathHash::of(&info.path);
        let tag = record_tag(&hash);
        self.inner
            .get_or_try_compute(&[PATHS_TAG, tag.as_str()], info.path.as_str(), || async {
                let record = match info.kind {
                    EntryKind::Directory => records.get_by_hash(&hash).await.or_raise(|| ErrorKind::Records)?,
                    EntryKind::File => None,
                };
                Ok::<_, Error>(ExportedChild::new(info, hash.clone(), record.as_ref()))
            })
            .await
    }

    /// Evict every snapshot linked to the record with this hash. Returns how
    /// many were evicted.
    pub fn invalidate(&self, hash: &PathHash) -> usize {
        self.inner.invalidate_tag(&record_tag(hash))
    }

    /// Evict every exported path.
    pub fn invalidate_all(&self) -> usize {
        self.inner.invalidate_tag(PATHS_TAG)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.inner.contains(path.as_str())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
