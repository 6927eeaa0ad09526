use super::CacheItem;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use crate::extract::VideoId;
use crate::resolver::StreamResult;

/// Resolved streams keyed by video id, bounded by count and by age.
pub struct Cache {
    store: LruCache<VideoId, CacheItem>,
    max_age: Duration,
}

impl Cache {
    pub fn new(capacity: NonZeroUsize, max_age: Duration) -> Self {
        Self {
            store: LruCache::new(capacity),
            max_age,
        }
    }

    /// Returns a fresh entry and marks it most recently used. Expired entries
    /// are dropped on the way.
    pub fn get(&mut self, key: &VideoId) -> Option<StreamResult> {
        let item = self.store.get(key)?;
        if item.is_fresh(Instant::now()) {
            return Some(item.result.clone());
        }
        self.store.pop(key);
        None
    }

    /// Inserts or replaces an entry, evicting the least recently used one
    /// when full.
    pub fn put(&mut self, key: VideoId, result: StreamResult) {
        let item = CacheItem {
            result,
            expires_at: Instant::now() + self.max_age,
        };
        self.store.put(key, item);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
