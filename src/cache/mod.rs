mod memory_cache;

pub use memory_cache::*;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::resolver::StreamResult;

// Upstream media links usually die after about six hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(4 * 3600);

pub type SharedCache = Arc<Mutex<Cache>>;

#[derive(Debug, Clone)]
pub struct CacheItem {
    pub result: StreamResult,
    pub expires_at: Instant,
}

impl CacheItem {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}
