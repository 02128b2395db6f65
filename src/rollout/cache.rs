//! TTL cache for flag lookups.
//!
//! Concurrent readers share a read lock; refreshes race and the last insert wins.
//! Expired entries are swept on insert once the map outgrows its sweep mark.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Entry count that triggers the first sweep of expired entries
const SWEEP_MARK: usize = 1024;

struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    sweep_at: AtomicUsize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
            sweep_at: AtomicUsize::new(SWEEP_MARK),
        }
    }

    /// A zero TTL turns the cache into a pass-through.
    pub fn is_disabled(&self) -> bool {
        self.ttl <= Duration::zero()
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        if self.is_disabled() {
            return None;
        }
        let now = self.clock.now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        if self.is_disabled() {
            return;
        }
        let stored_at = self.clock.now();
        let mut entries = self.entries.write();
        entries.insert(key, CacheEntry { value, stored_at });
        if entries.len() >= self.sweep_at.load(Ordering::Relaxed) {
            let ttl = self.ttl;
            entries.retain(|_, entry| stored_at - entry.stored_at < ttl);
            // Next sweep waits for the live set to double.
            self.sweep_at
                .store(SWEEP_MARK.max(entries.len() * 2), Ordering::Relaxed);
        }
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.entries.write().retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
