//! Transformation result cache
//!
//! Content-fingerprinted store of prior stage outputs with TTL expiry and
//! scored eviction. One instance is shared across concurrent pipeline runs
//! behind a `tokio::sync::Mutex`; it is an explicit value owned by the
//! process context, never a global.

pub mod eviction;
pub mod key;

pub use eviction::EvictionStrategy;
pub use key::{classify, fingerprint, ContentCategory};

use crate::core::types::CachePriority;
use crate::scheduler::memory::MemoryPressure;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

/// Default entry time-to-live.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Growth ceiling for adaptive capacity, relative to the configured base.
const MAX_GROWTH_FACTOR: usize = 2;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub priority: CachePriority,
    pub access_count: u64,
    pub last_accessed_at: DateTime<Utc>,
    pub approx_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub clears: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct TransformCache {
    entries: IndexMap<String, CacheEntry>,
    capacity: usize,
    base_capacity: usize,
    strategy: EvictionStrategy,
    default_ttl: Duration,
    stats: CacheStats,
}

impl TransformCache {
    pub fn new(capacity: usize, strategy: EvictionStrategy) -> Self {
        TransformCache {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
            base_capacity: capacity.max(1),
            strategy,
            default_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            stats: CacheStats::default(),
        }
    }

    /// Override the default entry time-to-live, in minutes.
    pub fn with_ttl_minutes(mut self, minutes: i64) -> Self {
        self.default_ttl = Duration::minutes(minutes.max(1));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Fetch an unexpired value, bumping its access bookkeeping.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = Utc::now();
        match self.entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.access_count += 1;
                entry.last_accessed_at = now;
                self.stats.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                // Expired; drop it so a later set replaces wholesale.
                self.entries.shift_remove(key);
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert or replace an entry, evicting first when at capacity.
    pub fn set(&mut self, key: &str, value: String, priority: CachePriority, ttl: Option<Duration>) {
        let now = Utc::now();
        let ttl = ttl.unwrap_or(self.default_ttl);

        if !self.entries.contains_key(key) && self.entries.len() >= self.capacity {
            let removed =
                eviction::evict(&mut self.entries, self.capacity, self.strategy, now);
            self.stats.evictions += removed as u64;
        }

        let approx_size_bytes = value.len();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + ttl,
                priority,
                access_count: 0,
                last_accessed_at: now,
                approx_size_bytes,
            },
        );
        debug_assert!(self.entries.len() <= self.capacity);
    }

    /// Drop all TTL-expired entries immediately.
    pub fn evict_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - self.entries.len();
        self.stats.evictions += removed as u64;
        removed
    }

    /// Forced eviction pass used by the scheduler under memory pressure.
    pub fn force_evict(&mut self) -> usize {
        let now = Utc::now();
        let target = (self.capacity / 2).max(1);
        let removed = eviction::evict(&mut self.entries, target, self.strategy, now);
        self.stats.evictions += removed as u64;
        removed
    }

    pub fn clear(&mut self) {
        self.stats.evictions += self.entries.len() as u64;
        self.stats.clears += 1;
        self.entries.clear();
    }

    /// Adaptive management: inspect hit-rate and host memory pressure, then
    /// clear, clean up, or grow capacity within bounds.
    pub fn manage(&mut self, pressure: MemoryPressure) {
        match pressure {
            MemoryPressure::Critical => {
                tracing::warn!("cache: critical memory pressure, clearing all entries");
                self.clear();
                self.capacity = (self.base_capacity / 2).max(1);
            }
            MemoryPressure::High => {
                let now = Utc::now();
                let target = (self.capacity / 2).max(1);
                let removed = eviction::evict_size_based(&mut self.entries, target, now);
                self.stats.evictions += removed as u64;
                self.capacity = target.max(self.base_capacity / 4).max(1);
                tracing::debug!(removed, capacity = self.capacity, "cache: shrank under pressure");
            }
            MemoryPressure::Low => {
                let hit_rate = self.stats.hit_rate();
                if hit_rate > 0.7 && self.capacity < self.base_capacity * MAX_GROWTH_FACTOR {
                    self.capacity =
                        (self.capacity + self.capacity / 4).min(self.base_capacity * MAX_GROWTH_FACTOR);
                    tracing::debug!(capacity = self.capacity, "cache: grew capacity");
                } else if hit_rate < 0.3 && self.len() > self.capacity / 2 {
                    let count = self.len() / 4;
                    let removed = eviction::evict_lru(&mut self.entries, count);
                    self.stats.evictions += removed as u64;
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    #[cfg(test)]
    pub(crate) fn expire_now(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}
