use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE};

// Cache entry with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub body: String,
    pub tag: &'static str,
    pub created_at: Instant,
}

// Create a cache key (hash of path + query)
pub fn make_cache_key(path: &str, query: &[(&str, String)]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path);
    for (name, value) in query {
        hasher.update([0u8]);
        hasher.update(name);
        hasher.update([b'=']);
        hasher.update(value);
    }
    format!("{:x}", hasher.finalize())
}

// GET response bodies, valid for `ttl`, grouped by tag for invalidation
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if entry.created_at.elapsed() < self.ttl {
                CACHE_HITS.inc();
                log::debug!("cache hit ({})", entry.tag);
                return Some(entry.body.clone());
            }
        }
        // expired entries go on the next miss
        self.entries
            .remove_if(key, |_, entry| entry.created_at.elapsed() >= self.ttl);
        CACHE_MISSES.inc();
        None
    }

    pub fn insert(&self, key: String, tag: &'static str, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                body,
                tag,
                created_at: Instant::now(),
            },
        );
        CACHE_SIZE.set(self.entries.len() as f64);
    }

    // Drop every entry stored under `tag`
    pub fn invalidate(&self, tag: &str) {
        self.entries.retain(|_, entry| entry.tag != tag);
        CACHE_SIZE.set(self.entries.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
