use chrono::Duration;
use laminate::cache::{fingerprint, EvictionStrategy, TransformCache};
use laminate::core::types::CachePriority;
use laminate::pipeline::layers::LayerId;
use laminate::pipeline::transform::TransformOptions;
use laminate::scheduler::memory::MemoryPressure;

#[test]
fn set_then_get_round_trips() {
    let mut cache = TransformCache::new(16, EvictionStrategy::Staged);
    cache.set(
        "module:1-2:abc:def",
        "export default App;".to_string(),
        CachePriority::Normal,
        None,
    );
    assert_eq!(
        cache.get("module:1-2:abc:def"),
        Some("export default App;".to_string())
    );
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 0);
}

#[test]
fn entry_past_its_ttl_is_a_miss() {
    let mut cache = TransformCache::new(16, EvictionStrategy::Staged);
    cache.set(
        "k",
        "v".to_string(),
        CachePriority::High,
        Some(Duration::seconds(-1)),
    );
    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.stats().misses, 1);
    // Expired reads remove the entry.
    assert!(cache.is_empty());
}

#[test]
fn evict_expired_sweeps_only_stale_entries() {
    let mut cache = TransformCache::new(16, EvictionStrategy::Staged);
    cache.set("fresh", "a".to_string(), CachePriority::Normal, None);
    cache.set(
        "stale-1",
        "b".to_string(),
        CachePriority::Normal,
        Some(Duration::seconds(-1)),
    );
    cache.set(
        "stale-2",
        "c".to_string(),
        CachePriority::High,
        Some(Duration::seconds(-1)),
    );
    assert_eq!(cache.evict_expired(), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("fresh"), Some("a".to_string()));
}

#[test]
fn capacity_bound_holds_for_every_strategy() {
    for strategy in [
        EvictionStrategy::Staged,
        EvictionStrategy::SizeBased,
        EvictionStrategy::Predictive,
    ] {
        let mut cache = TransformCache::new(8, strategy);
        for i in 0..100 {
            let priority = if i % 3 == 0 {
                CachePriority::High
            } else {
                CachePriority::Normal
            };
            cache.set(&format!("key-{}", i), format!("value-{}", i), priority, None);
            assert!(
                cache.len() <= cache.capacity(),
                "{:?} overflowed at insert {}",
                strategy,
                i
            );
        }
        assert!(cache.stats().evictions > 0, "{:?} never evicted", strategy);
    }
}

#[test]
fn overwriting_a_key_does_not_evict() {
    let mut cache = TransformCache::new(2, EvictionStrategy::Staged);
    cache.set("a", "1".to_string(), CachePriority::Normal, None);
    cache.set("b", "2".to_string(), CachePriority::Normal, None);
    cache.set("a", "3".to_string(), CachePriority::Normal, None);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 0);
    assert_eq!(cache.get("a"), Some("3".to_string()));
}

#[test]
fn force_evict_shrinks_to_half_capacity() {
    let mut cache = TransformCache::new(10, EvictionStrategy::SizeBased);
    for i in 0..10 {
        cache.set(&format!("key-{}", i), "x".repeat(i + 1), CachePriority::Normal, None);
    }
    cache.force_evict();
    assert!(cache.len() <= 5);
}

#[test]
fn clear_resets_entries_and_counts_a_clear() {
    let mut cache = TransformCache::new(10, EvictionStrategy::Staged);
    cache.set("k", "v".to_string(), CachePriority::High, None);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().clears, 1);
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn critical_pressure_empties_and_halves_capacity() {
    let mut cache = TransformCache::new(10, EvictionStrategy::Staged);
    for i in 0..10 {
        cache.set(&format!("key-{}", i), "v".to_string(), CachePriority::High, None);
    }
    cache.manage(MemoryPressure::Critical);
    assert!(cache.is_empty());
    assert_eq!(cache.capacity(), 5);
}

#[test]
fn high_pressure_halves_the_working_set() {
    let mut cache = TransformCache::new(10, EvictionStrategy::Staged);
    for i in 0..10 {
        cache.set(&format!("key-{}", i), "v".repeat(i + 1), CachePriority::Normal, None);
    }
    cache.manage(MemoryPressure::High);
    assert!(cache.len() <= 5);
    assert!(cache.capacity() <= 5);
}

#[test]
fn hit_rate_reflects_lookup_history() {
    let mut cache = TransformCache::new(10, EvictionStrategy::Staged);
    cache.set("k", "v".to_string(), CachePriority::Normal, None);
    cache.get("k");
    cache.get("absent");
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn fingerprint_shape_and_layer_order_invariance() {
    let options = TransformOptions::new();
    let code = "import App from './App';\nexport default App;\n";
    let key = fingerprint(code, &[LayerId(3), LayerId(1), LayerId(2)], &options);

    let parts: Vec<&str> = key.split(':').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], "module");
    assert_eq!(parts[1], "1-2-3");
    assert_eq!(parts[2].len(), 64);
    assert_eq!(parts[3].len(), 64);

    let reordered = fingerprint(code, &[LayerId(2), LayerId(3), LayerId(1)], &options);
    assert_eq!(key, reordered);
}

#[test]
fn fingerprint_separates_distinct_remaining_sets() {
    let options = TransformOptions::new();
    let code = "const a = 1;";
    let full = fingerprint(code, &[LayerId(1), LayerId(2)], &options);
    let tail = fingerprint(code, &[LayerId(2)], &options);
    assert_ne!(full, tail);
}
