//! Tag-scoped, write-once memoization.
//!
//! Values are computed at most once per key and kept until explicitly
//! invalidated, either individually or by every key filed under a tag. There
//! is no expiry and no size bound: the working set is the set of directories
//! people actually browse.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::trace;

/// Two-level cache: `key -> value cell` plus `tag -> keys`.
///
/// Concurrent callers asking for the same missing key share one computation
/// (single-flight). A computation that fails or is dropped before finishing
/// leaves the key empty, so the next caller starts over.
pub struct TaggedCache<V> {
    entries: DashMap<String, Arc<OnceCell<V>>>,
    tags: DashMap<String, HashSet<String>>,
}

impl<V> Default for TaggedCache<V> {
    fn default() -> Self {
        Self { entries: DashMap::new(), tags: DashMap::new() }
    }
}

impl<V: Clone> TaggedCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized value for `key`, computing it if absent.
    ///
    /// The key is filed under every tag in `tags` before computing so that an
    /// [`invalidate_tag()`](Self::invalidate_tag) racing with the compute
    /// still evicts it.
    pub async fn get_or_try_compute<F, Fut, E>(&self, tags: &[&str], key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // Clone the cell out so no map guard is held across the await below.
        let cell = self.entries.entry(key.to_string()).or_default().clone();
        for tag in tags {
            self.tags.entry(tag.to_string()).or_default().insert(key.to_string());
        }
        if let Some(value) = cell.get() {
            trace!(?tags, key, "cache hit");
            return Ok(value.clone());
        }
        let value = cell
            .get_or_try_init(|| async move {
                trace!(?tags, key, "cache miss");
                compute().await
            })
            .await?;
        Ok(value.clone())
    }

    /// Evict every key filed under `tag`. Returns how many keys were evicted.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let Some((_, keys)) = self.tags.remove(tag) else {
            return 0;
        };
        keys.iter().filter(|key| self.entries.remove(key.as_str()).is_some()).count()
    }

    /// Evict a single key from every tag it is filed under.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        for mut keys in self.tags.iter_mut() {
            keys.remove(key);
        }
        removed
    }

    /// Whether a value has been computed and stored for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|cell| cell.initialized())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
