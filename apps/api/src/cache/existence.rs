//! Bounded, time-expiring memory of ids confirmed present in durable storage.
//!
//! Only positive observations are recorded. An id lands here after a listing
//! confirmed the object or after a successful upload, and never otherwise.
//! Entries expire after `ttl` and the least recently used entry is evicted
//! once `capacity` is reached.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

pub struct ExistenceCache {
    entries: Mutex<LruCache<String, Instant>>,
    ttl: Duration,
}

impl ExistenceCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// True if `id` was observed present within the TTL. Expired entries are
    /// dropped on the way out.
    pub fn contains(&self, id: &str) -> bool {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(id)
            .map(|observed_at| observed_at.elapsed() < self.ttl);
        match fresh {
            Some(true) => true,
            Some(false) => {
                entries.pop(id);
                false
            }
            None => false,
        }
    }

    pub fn mark_present(&self, id: &str) {
        self.entries.lock().put(id.to_string(), Instant::now());
    }

    pub fn forget(&self, id: &str) {
        self.entries.lock().pop(id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
