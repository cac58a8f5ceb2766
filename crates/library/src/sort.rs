//! Ordering of exported children.
//!
//! Backends already list children by name ascending, which is also the
//! default ordering, so the common case does no sorting work at all.

use crate::export::ExportedChild;
use derive_more::Display;
use serde::Serialize;
use std::cmp::Ordering;
use time::OffsetDateTime;
use trove_storage::{EntryInfo, EntryKind, compare_names};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderMethod {
    #[default]
    #[display("name")]
    Name,
    #[display("size")]
    Size,
    #[display("date")]
    Date,
    /// Directories before files.
    #[display("kind")]
    Kind,
}
impl OrderMethod {
    /// Unknown or missing values fall back to [`OrderMethod::Name`].
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("size") => Self::Size,
            Some("date") => Self::Date,
            Some("kind") => Self::Kind,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}
impl OrderDirection {
    /// Unknown or missing values fall back to [`OrderDirection::Asc`].
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    /// The direction a "toggle" link should switch to.
    pub fn inverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Anything that can be ordered in a listing.
pub trait Sortable {
    fn sort_name(&self) -> &str;
    fn sort_size(&self) -> u64;
    fn sort_modified(&self) -> OffsetDateTime;
    fn sort_kind(&self) -> EntryKind;
}
impl Sortable for ExportedChild {
    fn sort_name(&self) -> &str {
        &self.name
    }

    fn sort_size(&self) -> u64 {
        self.size
    }

    fn sort_modified(&self) -> OffsetDateTime {
        self.modified
    }

    fn sort_kind(&self) -> EntryKind {
        self.kind
    }
}
impl Sortable for EntryInfo {
    fn sort_name(&self) -> &str {
        self.name()
    }

    fn sort_size(&self) -> u64 {
        self.size
    }

    fn sort_modified(&self) -> OffsetDateTime {
        self.modified
    }

    fn sort_kind(&self) -> EntryKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SortOrder {
    pub method: OrderMethod,
    pub direction: OrderDirection,
}
impl SortOrder {
    pub fn new(method: OrderMethod, direction: OrderDirection) -> Self {
        Self { method, direction }
    }

    /// Build from raw `order` and `dir` query values, falling back to
    /// `name`/`asc` for anything unrecognised.
    pub fn from_query(order: Option<&str>, dir: Option<&str>) -> Self {
        Self::new(OrderMethod::from_query(order), OrderDirection::from_query(dir))
    }

    /// Whether this is the order backends already return children in.
    pub fn is_natural(&self) -> bool {
        self.method == OrderMethod::Name && self.direction == OrderDirection::Asc
    }

    /// Reorder `items`. Stable, so equal items keep their incoming (name) order
    /// in both directions.
    pub fn apply<T: Sortable>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.is_natural() {
            return items;
        }
        items.sort_by(|a, b| match self.direction {
            OrderDirection::Asc => self.compare(a, b),
            OrderDirection::Desc => self.compare(a, b).reverse(),
        });
        items
    }

    fn compare<T: Sortable>(&self, a: &T, b: &T) -> Ordering {
        match self.method {
            OrderMethod::Name => compare_names(a.sort_name(), b.sort_name()),
            OrderMethod::Size => a.sort_size().cmp(&b.sort_size()),
            OrderMethod::Date => a.sort_modified().cmp(&b.sort_modified()),
            OrderMethod::Kind => a.sort_kind().is_file().cmp(&b.sort_kind().is_file()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    struct Counted<'a> {
        name: &'static str,
        size: u64,
        kind: EntryKind,
        calls: &'a Cell<usize>,
    }
    impl Sortable for Counted<'_> {
        fn sort_name(&self) -> &str {
            self.calls.set(self.calls.get() + 1);
            self.name
        }

        fn sort_size(&self) -> u64 {
            self.calls.set(self.calls.get() + 1);
            self.size
        }

        fn sort_modified(&self) -> OffsetDateTime {
            self.calls.set(self.calls.get() + 1);
            OffsetDateTime::UNIX_EPOCH
        }

        fn sort_kind(&self) -> EntryKind {
            self.calls.set(self.calls.get() + 1);
            self.kind
        }
    }

    fn items(calls: &Cell<usize>) -> Vec<Counted<'_>> {
        [
            ("a", 10, EntryKind::File),
            ("b", 30, EntryKind::Directory),
            ("c", 10, EntryKind::File),
            ("d", 20, EntryKind::Directory),
        ]
        .into_iter()
        .map(|(name, size, kind)| Counted { name, size, kind, calls })
        .collect()
    }

    fn names(items: &[Counted<'_>]) -> Vec<&'static str> {
        items.iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_natural_order_is_untouched() {
        let calls = Cell::new(0);
        let sorted = SortOrder::default().apply(items(&calls));
        assert_eq!(names(&sorted), vec!["a", "b", "c", "d"]);
        assert_eq!(calls.get(), 0);
    }

    #[rstest]
    #[case(OrderMethod::Size, OrderDirection::Asc, vec!["a", "c", "d", "b"])]
    // Ties (a, c) keep their original order when descending too.
    #[case(OrderMethod::Size, OrderDirection::Desc, vec!["b", "d", "a", "c"])]
    #[case(OrderMethod::Name, OrderDirection::Desc, vec!["d", "c", "b", "a"])]
    #[case(OrderMethod::Kind, OrderDirection::Asc, vec!["b", "d", "a", "c"])]
    #[case(OrderMethod::Kind, OrderDirection::Desc, vec!["a", "c", "b", "d"])]
    #[case(OrderMethod::Date, OrderDirection::Desc, vec!["a", "b", "c", "d"])]
    fn test_apply(#[case] method: OrderMethod, #[case] direction: OrderDirection, #[case] expected: Vec<&str>) {
        let calls = Cell::new(0);
        let sorted = SortOrder::new(method, direction).apply(items(&calls));
        assert_eq!(names(&sorted), expected);
        assert!(calls.get() > 0);
    }

    #[rstest]
    #[case(None, None, OrderMethod::Name, OrderDirection::Asc)]
    #[case(Some("size"), Some("desc"), OrderMethod::Size, OrderDirection::Desc)]
    #[case(Some("date"), Some("asc"), OrderMethod::Date, OrderDirection::Asc)]
    #[case(Some("kind"), None, OrderMethod::Kind, OrderDirection::Asc)]
    #[case(Some("bogus"), Some("sideways"), OrderMethod::Name, OrderDirection::Asc)]
    #[case(Some("SIZE"), Some("DESC"), OrderMethod::Name, OrderDirection::Asc)]
    fn test_from_query(
        #[case] order: Option<&str>,
        #[case] dir: Option<&str>,
        #[case] method: OrderMethod,
        #[case] direction: OrderDirection,
    ) {
        assert_eq!(SortOrder::from_query(order, dir), SortOrder::new(method, direction));
    }

    #[test]
    fn test_inverse() {
        assert_eq!(OrderDirection::Asc.inverse(), OrderDirection::Desc);
        assert_eq!(OrderDirection::Desc.inverse(), OrderDirection::Asc);
        assert_eq!(OrderDirection::Desc.to_string(), "desc");
    }
}
