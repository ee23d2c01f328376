//! Epoch-tagged cache of per-entity lists.
//!
//! Each key maps to `(value, epoch)`. Invalidation bumps the key's epoch and
//! keeps the old value, which stays readable as stale. A fetch records the
//! epoch it started under and stores its result through
//! [`EpochCache::insert_if_epoch`]; if the key was invalidated while the fetch
//! was in flight, the result is stored as stale rather than current.
//!
//! The internal lock is only ever held for a map operation, never across an
//! await point.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A cached value as seen by a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<V> {
    /// Stored under the current epoch
    Fresh(V),
    /// Stored under an older epoch
    Stale(V),
    /// Nothing stored
    Missing,
}

impl<V> Cached<V> {
    /// The value regardless of freshness.
    #[must_use]
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Fresh(value) | Self::Stale(value) => Some(value),
            Self::Missing => None,
        }
    }

    /// Whether the value is current.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: Option<V>,
    stored_at: u64,
    epoch: u64,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            value: None,
            stored_at: 0,
            epoch: 0,
        }
    }
}

/// Cache statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Keys holding a current value
    pub fresh: usize,
    /// Keys holding only a stale value
    pub stale: usize,
}

/// Per-key cache with epoch-based invalidation.
#[derive(Debug)]
pub struct EpochCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> Default for EpochCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> EpochCache<K, V>
where
    K: Eq + Hash + Copy,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        // A panic while holding the lock leaves the map itself consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current epoch of `key`. Record this before starting a fetch.
    #[must_use]
    pub fn epoch(&self, key: K) -> u64 {
        self.entries().get(&key).map_or(0, |entry| entry.epoch)
    }

    /// The current value of `key`, if it is fresh.
    #[must_use]
    pub fn get(&self, key: K) -> Option<V> {
        match self.lookup(key) {
            Cached::Fresh(value) => Some(value),
            Cached::Stale(_) | Cached::Missing => None,
        }
    }

    /// The stored value of `key` with its freshness.
    #[must_use]
    pub fn lookup(&self, key: K) -> Cached<V> {
        let entries = self.entries();
        match entries.get(&key) {
            Some(Entry {
                value: Some(value),
                stored_at,
                epoch,
            }) => {
                if stored_at == epoch {
                    Cached::Fresh(value.clone())
                } else {
                    Cached::Stale(value.clone())
                }
            }
            _ => Cached::Missing,
        }
    }

    /// Store the result of a fetch that started under `started_at`.
    ///
    /// Returns `true` when the value was stored as current, `false` when the
    /// key was invalidated in the meantime and the value was stored as stale.
    /// A value from a fetch that started before the one already stored is
    /// discarded and also yields `false`.
    pub fn insert_if_epoch(&self, key: K, started_at: u64, value: V) -> bool {
        let mut entries = self.entries();
        let entry = entries.entry(key).or_default();
        if entry.value.is_some() && entry.stored_at > started_at {
            return false;
        }
        entry.value = Some(value);
        entry.stored_at = started_at;
        started_at == entry.epoch
    }

    /// Mark the value of `key` as outdated.
    pub fn invalidate(&self, key: K) {
        let mut entries = self.entries();
        let entry = entries.entry(key).or_default();
        entry.epoch += 1;
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries();
        let mut stats = CacheStats { fresh: 0, stale: 0 };
        for entry in entries.values().filter(|entry| entry.value.is_some()) {
            if entry.stored_at == entry.epoch {
                stats.fresh += 1;
            } else {
                stats.stale += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache: EpochCache<i64, Vec<&str>> = EpochCache::new();
        assert_eq!(cache.lookup(1), Cached::Missing);

        let epoch = cache.epoch(1);
        assert!(cache.insert_if_epoch(1, epoch, vec!["a"]));
        assert_eq!(cache.get(1), Some(vec!["a"]));
    }

    #[test]
    fn test_invalidation_keeps_stale_value() {
        let cache: EpochCache<i64, Vec<&str>> = EpochCache::new();
        cache.insert_if_epoch(1, cache.epoch(1), vec!["a"]);

        cache.invalidate(1);

        assert_eq!(cache.get(1), None);
        assert_eq!(cache.lookup(1), Cached::Stale(vec!["a"]));
        assert_eq!(cache.stats(), CacheStats { fresh: 0, stale: 1 });
    }

    #[test]
    fn test_fetch_overtaken_by_invalidation_is_stale() {
        let cache: EpochCache<i64, Vec<&str>> = EpochCache::new();

        let started = cache.epoch(7);
        cache.invalidate(7);
        assert!(!cache.insert_if_epoch(7, started, vec!["old"]));
        assert!(!cache.lookup(7).is_fresh());

        let restarted = cache.epoch(7);
        assert!(cache.insert_if_epoch(7, restarted, vec!["new"]));
        assert_eq!(cache.get(7), Some(vec!["new"]));
    }

    #[test]
    fn test_older_fetch_never_replaces_newer_value() {
        let cache: EpochCache<i64, Vec<&str>> = EpochCache::new();

        let first = cache.epoch(1);
        cache.invalidate(1);
        let second = cache.epoch(1);
        assert!(cache.insert_if_epoch(1, second, vec!["old", "new"]));

        assert!(!cache.insert_if_epoch(1, first, vec!["old"]));
        assert_eq!(cache.get(1), Some(vec!["old", "new"]));
        assert_eq!(cache.lookup(1), Cached::Fresh(vec!["old", "new"]));
    }

    #[test]
    fn test_keys_are_independent() {
        let cache: EpochCache<i64, u8> = EpochCache::new();
        cache.insert_if_epoch(1, 0, 10);
        cache.insert_if_epoch(2, 0, 20);

        cache.invalidate(1);

        assert_eq!(cache.get(2), Some(20));
        assert_eq!(cache.stats(), CacheStats { fresh: 1, stale: 1 });
    }
}
