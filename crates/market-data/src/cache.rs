//! Bounded, TTL-aware dataset cache.
//!
//! Entries are evicted least-recently-accessed first once the entry capacity
//! or the optional byte budget is exceeded. Expired entries never satisfy a
//! lookup: they are dropped lazily on read and actively on insert.

use chrono::{DateTime, Utc};
use dlmm_core::types::{HistoricalDataset, Interval};
use lru::LruCache;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::debug;

/// Deterministic key for a pool/range/interval request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            pool_address,
            start.timestamp_millis(),
            end.timestamp_millis(),
            interval
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached dataset with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Pool the dataset was requested for.
    pub pool_address: String,
    pub dataset: Arc<HistoricalDataset>,
    pub hits: u64,
    pub inserted_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub size_bytes: usize,
}

impl CacheEntry {
    pub fn new(
        pool_address: &str,
        dataset: Arc<HistoricalDataset>,
        size_bytes: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            pool_address: pool_address.to_string(),
            dataset,
            hits: 0,
            inserted_at: now,
            last_accessed: now,
            size_bytes,
        }
    }
}

/// Per-entry view exposed in [`CacheStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStats {
    pub key: String,
    pub pool_address: String,
    pub hits: u64,
    pub size_bytes: usize,
    pub inserted_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// Snapshot of cache usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub total_hits: u64,
    pub total_size_bytes: usize,
    /// Sorted by hit count, highest first.
    pub entries: Vec<CacheEntryStats>,
}

/// Dataset cache with capacity, TTL and optional byte budget.
#[derive(Debug)]
pub struct DatasetCache {
    /// Zero disables caching.
    capacity: usize,
    ttl: StdDuration,
    max_bytes: Option<usize>,
    entries: LruCache<CacheKey, CacheEntry>,
    total_bytes: usize,
}

impl DatasetCache {
    /// Create a cache. A capacity of zero disables caching.
    pub fn new(capacity: usize, ttl: StdDuration, max_bytes: Option<usize>) -> Self {
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity,
            ttl,
            max_bytes,
            entries: LruCache::new(bound),
            total_bytes: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a dataset, counting a hit when found and fresh.
    pub fn get(&mut self, key: &CacheKey, now: DateTime<Utc>) -> Option<Arc<HistoricalDataset>> {
        let ttl = self.ttl;
        let expired = self
            .entries
            .peek(key)
            .map(|e| expired_at(e.inserted_at, ttl, now))?;
        if expired {
            self.remove(key);
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.hits += 1;
        entry.last_accessed = now;

        debug!(key = %key, hits = entry.hits, "Cache hit");
        Some(Arc::clone(&entry.dataset))
    }

    /// Store an entry, replacing any entry under the same key.
    ///
    /// `entry.size_bytes` is trusted as given. Returns the number of entries
    /// evicted to make room.
    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry, now: DateTime<Utc>) -> usize {
        if self.capacity == 0 {
            return 0;
        }

        let mut evicted = self.purge_expired(now);
        self.total_bytes += entry.size_bytes;

        if let Some((old_key, old)) = self.entries.push(key.clone(), entry) {
            self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes);
            if old_key != key {
                evicted += 1;
                debug!(key = %old_key, "Evicted least recently used cache entry");
            }
        }

        // The new entry is most recent, so it is only popped when alone.
        while self.over_byte_budget() && self.entries.len() > 1 {
            match self.entries.pop_lru() {
                Some((victim, old)) => {
                    self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes);
                    evicted += 1;
                    debug!(key = %victim, "Evicted cache entry over byte budget");
                }
                None => break,
            }
        }

        evicted
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        self.remove_where(|e| expired_at(e.inserted_at, ttl, now))
    }

    /// Drop every entry for a pool. Returns how many were removed.
    pub fn invalidate_pool(&mut self, pool_address: &str) -> usize {
        self.remove_where(|e| e.pool_address == pool_address)
    }

    /// Remove all entries and hit counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }

    /// Current usage, entries ordered by hits descending.
    pub fn stats(&self) -> CacheStats {
        let mut entries: Vec<CacheEntryStats> = self
            .entries
            .iter()
            .map(|(key, e)| CacheEntryStats {
                key: key.to_string(),
                pool_address: e.pool_address.clone(),
                hits: e.hits,
                size_bytes: e.size_bytes,
                inserted_at: e.inserted_at,
                last_accessed: e.last_accessed,
            })
            .collect();
        entries.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.key.cmp(&b.key)));

        CacheStats {
            size: entries.len(),
            total_hits: entries.iter().map(|e| e.hits).sum(),
            total_size_bytes: self.total_bytes,
            entries,
        }
    }

    fn over_byte_budget(&self) -> bool {
        self.max_bytes.is_some_and(|max| self.total_bytes > max)
    }

    fn remove(&mut self, key: &CacheKey) {
        if let Some(old) = self.entries.pop(key) {
            self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes);
        }
    }

    fn remove_where(&mut self, predicate: impl Fn(&CacheEntry) -> bool) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, e)| predicate(e))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }
}

fn expired_at(inserted_at: DateTime<Utc>, ttl: StdDuration, now: DateTime<Utc>) -> bool {
    // A negative age (clock went backwards) counts as fresh.
    (now - inserted_at)
        .to_std()
        .map(|age| age > ttl)
        .unwrap_or(false)
}
