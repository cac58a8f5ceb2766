mod record;
mod report;

pub(crate) use self::record::RecordRow;
pub use self::record::PathRecord;
pub(crate) use self::report::ReportRow;
pub use self::report::Report;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::OffsetDateTime;

pub(crate) fn timestamp(value: i64, field: &'static str) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData(field))
}
