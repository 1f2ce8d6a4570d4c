//! Get-or-add cache plumbing shared by every resolver
//!
//! Concurrent first lookups of the same key may both compute; the first
//! value inserted is published and every caller returns that one.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

/// Concurrent map used for all caches
pub(crate) type FxDashMap<K, V> = DashMap<K, V, FxBuildHasher>;

/// Hit/compute counters for one cache
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    computed: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn computed(&self) {
        self.computed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            computed: self.computed.load(Ordering::Relaxed),
            entries,
        }
    }

    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.computed.store(0, Ordering::Relaxed);
    }
}

/// Statistics for one cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that ran the resolution (including failed ones)
    pub computed: u64,
    /// Published entries
    pub entries: usize,
}

/// Return the published value for `key`, computing and publishing it on a
/// miss. Errors are returned without touching the cache.
pub(crate) fn get_or_add<K, V, E>(
    map: &FxDashMap<K, V>,
    counters: &CacheCounters,
    key: K,
    compute: impl FnOnce() -> Result<V, E>,
) -> Result<V, E>
where
    K: Eq + Hash,
    V: Clone,
{
    if let Some(hit) = map.get(&key) {
        counters.hit();
        return Ok(hit.value().clone());
    }
    counters.computed();
    // No shard lock is held while computing.
    let value = compute()?;
    Ok(map.entry(key).or_insert(value).value().clone())
}
