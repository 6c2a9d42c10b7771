//! Eviction strategies
//!
//! Each strategy reduces the entry map below the capacity target. `evict`
//! guarantees the bound regardless of what the strategy's scoring pass
//! removed, so callers can rely on `len < capacity` on return.

use super::CacheEntry;
use crate::core::types::CachePriority;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::str::FromStr;

/// Score below which the predictive strategy drops an entry outright.
const PREDICTIVE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionStrategy {
    #[default]
    Staged,
    SizeBased,
    Predictive,
}

impl FromStr for EvictionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staged" => Ok(EvictionStrategy::Staged),
            "size" => Ok(EvictionStrategy::SizeBased),
            "predictive" => Ok(EvictionStrategy::Predictive),
            other => Err(format!("unknown eviction strategy '{}'", other)),
        }
    }
}

/// Run the configured strategy, then enforce the capacity bound.
pub fn evict(
    entries: &mut IndexMap<String, CacheEntry>,
    capacity: usize,
    strategy: EvictionStrategy,
    now: DateTime<Utc>,
) -> usize {
    let before = entries.len();
    match strategy {
        EvictionStrategy::Staged => evict_staged(entries, capacity, now),
        EvictionStrategy::SizeBased => {
            evict_size_based(entries, capacity, now);
        }
        EvictionStrategy::Predictive => evict_predictive(entries, capacity, now),
    }
    // Whatever the scoring pass left, the bound must hold.
    while entries.len() >= capacity.max(1) {
        remove_lowest(entries, now);
    }
    before - entries.len()
}

/// Staged policy: TTL-expired first, then the lowest-scoring 30%.
fn evict_staged(entries: &mut IndexMap<String, CacheEntry>, capacity: usize, now: DateTime<Utc>) {
    entries.retain(|_, entry| entry.expires_at > now);
    if entries.len() < capacity {
        return;
    }

    let mut scored: Vec<(String, f64)> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), staged_score(entry, now)))
        .collect();
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let to_remove = (entries.len() * 3 / 10).max(1);
    for (key, _) in scored.into_iter().take(to_remove) {
        entries.shift_remove(&key);
    }
}

/// Size-based variant: largest, lowest-priority entries go first.
pub(super) fn evict_size_based(
    entries: &mut IndexMap<String, CacheEntry>,
    capacity: usize,
    _now: DateTime<Utc>,
) -> usize {
    let before = entries.len();
    while entries.len() >= capacity.max(1) {
        let victim = entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.priority
                    .weight()
                    .partial_cmp(&b.priority.weight())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.approx_size_bytes.cmp(&a.approx_size_bytes))
            })
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => {
                entries.shift_remove(&key);
            }
            None => break,
        }
    }
    before - entries.len()
}

/// Predictive variant: frequency decayed by recency; entries below the
/// threshold are dropped, preserving High priority while possible.
fn evict_predictive(
    entries: &mut IndexMap<String, CacheEntry>,
    capacity: usize,
    now: DateTime<Utc>,
) {
    let doomed: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| {
            entry.priority != CachePriority::High
                && predictive_score(entry, now) < PREDICTIVE_THRESHOLD
        })
        .map(|(key, _)| key.clone())
        .collect();
    for key in doomed {
        if entries.len() < capacity {
            break;
        }
        entries.shift_remove(&key);
    }
}

/// Remove the `count` least-recently-accessed entries.
pub(super) fn evict_lru(entries: &mut IndexMap<String, CacheEntry>, count: usize) -> usize {
    let mut by_access: Vec<(String, DateTime<Utc>)> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), entry.last_accessed_at))
        .collect();
    by_access.sort_by_key(|(_, at)| *at);

    let mut removed = 0;
    for (key, _) in by_access.into_iter().take(count) {
        entries.shift_remove(&key);
        removed += 1;
    }
    removed
}

/// `priorityWeight*10 + accessFrequencyPerDay*5 − recencyHours`
fn staged_score(entry: &CacheEntry, now: DateTime<Utc>) -> f64 {
    let age_days = age_hours(entry, now).max(0.01) / 24.0;
    let frequency_per_day = entry.access_count as f64 / age_days.max(0.01);
    let recency_hours = (now - entry.last_accessed_at).num_seconds().max(0) as f64 / 3600.0;
    entry.priority.weight() * 10.0 + frequency_per_day * 5.0 - recency_hours
}

/// `(accessCount/ageHours) * exp(−hoursSinceLastAccess/24)`
fn predictive_score(entry: &CacheEntry, now: DateTime<Utc>) -> f64 {
    let age = age_hours(entry, now).max(0.01);
    let since_access = (now - entry.last_accessed_at).num_seconds().max(0) as f64 / 3600.0;
    (entry.access_count as f64 / age) * (-since_access / 24.0).exp()
}

fn age_hours(entry: &CacheEntry, now: DateTime<Utc>) -> f64 {
    (now - entry.created_at).num_seconds().max(0) as f64 / 3600.0
}

/// Fallback victim selection: lowest staged score, High priority last.
fn remove_lowest(entries: &mut IndexMap<String, CacheEntry>, now: DateTime<Utc>) {
    let victim = entries
        .iter()
        .min_by(|(_, a), (_, b)| {
            let high_a = a.priority == CachePriority::High;
            let high_b = b.priority == CachePriority::High;
            high_a
                .cmp(&high_b)
                .then_with(|| {
                    staged_score(a, now)
                        .partial_cmp(&staged_score(b, now))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        })
        .map(|(key, _)| key.clone());
    if let Some(key) = victim {
        entries.shift_remove(&key);
    }
}
