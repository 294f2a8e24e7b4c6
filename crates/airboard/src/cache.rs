//! Time-boxed cache of loaded datasets.
//!
//! A [`DatasetCache`] is created once per process and passed by reference to
//! whoever loads data. Entries are immutable: a fresh entry is handed out as
//! a shared [`Arc`], and an expired one is replaced wholesale on the next
//! load.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::pipeline::LoadedDataset;

/// Identifies one cached dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source URL or file path.
    pub source: String,
    /// Version of the normalization rules that produced the dataset.
    pub version: String,
}

impl CacheKey {
    /// Create a new key.
    #[must_use]
    pub fn new(source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    dataset: Arc<LoadedDataset>,
    loaded_at: Instant,
}

/// Datasets keyed by source and version, each valid for one TTL.
#[derive(Debug)]
pub struct DatasetCache {
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl DatasetCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// How long an entry stays fresh.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The entry for `key` if it is still fresh at `now`.
    #[must_use]
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<Arc<LoadedDataset>> {
        self.entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.loaded_at) < self.ttl)
            .map(|entry| Arc::clone(&entry.dataset))
    }

    /// The fresh entry for `key`, or the result of `loader` stored in its place.
    pub fn get_or_load(
        &mut self,
        key: &CacheKey,
        now: Instant,
        loader: impl FnOnce() -> LoadedDataset,
    ) -> Arc<LoadedDataset> {
        if let Some(dataset) = self.get(key, now) {
            debug!(source = %key.source, "Dataset cache hit");
            return dataset;
        }

        debug!(source = %key.source, "Dataset cache miss, loading");
        let dataset = Arc::new(loader());
        self.entries.insert(
            key.clone(),
            CacheEntry {
                dataset: Arc::clone(&dataset),
                loaded_at: now,
            },
        );
        dataset
    }

    /// Drop the entry for `key`. Returns true if one existed.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, fresh or expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
