// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! LRU bounds, expiry and statistics of the shared store

use dara_node::cache::{BoundedCache, CacheStats};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_least_recently_used_entry_is_evicted() {
    let cache = BoundedCache::new("test", 3, None);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);

    // touching "a" makes "b" the oldest
    assert_eq!(cache.get("a"), Some(1));
    cache.set("d", 4);

    assert!(cache.contains("a"));
    assert!(!cache.contains("b"));
    assert!(cache.contains("c"));
    assert!(cache.contains("d"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_overwrite_never_evicts() {
    let cache = BoundedCache::new("test", 2, None);
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("a", 10);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), Some(10));
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn test_size_never_exceeds_bound() {
    let cache = BoundedCache::new("test", 5, None);
    for i in 0..50 {
        cache.set(format!("k{}", i), i);
        assert!(cache.len() <= 5);
    }
    let stats = cache.stats();
    assert_eq!(stats.size, 5);
    assert_eq!(stats.maxsize, 5);
    assert_eq!(stats.evictions, 45);
}

#[test]
fn test_expired_entries_are_misses() {
    let cache = BoundedCache::new("test", 4, Some(Duration::from_millis(30)));
    cache.set("a", 1);
    assert_eq!(cache.get("a"), Some(1));

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(cache.get("a"), None);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 0);
    assert_eq!(stats.evictions, 0);
}

#[test]
fn test_hit_rate_and_clear() {
    let cache = BoundedCache::new("test", 4, None);
    assert_eq!(cache.stats(), CacheStats { maxsize: 4, ..CacheStats::default() });

    cache.set("a", "x".to_string());
    cache.get("a");
    cache.get("a");
    cache.get("a");
    cache.get("missing");

    let stats = cache.stats();
    assert!((stats.hit_rate - 0.75).abs() < 1e-9);

    assert_eq!(cache.clear(), 1);
    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 3);
}

#[test]
fn test_stats_serialize_camel_case() {
    let cache = BoundedCache::<u32>::new("test", 2, None);
    let json = serde_json::to_value(cache.stats()).unwrap();
    for field in ["hits", "misses", "evictions", "size", "maxsize", "hitRate"] {
        assert!(json.get(field).is_some(), "missing {}", field);
    }
}

#[test]
fn test_parallel_writers_keep_bound() {
    let cache = Arc::new(BoundedCache::new("test", 16, None));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    cache.set(format!("{}-{}", t, i), i);
                    cache.get(&format!("{}-{}", t, i / 2));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.size, 16);
    assert_eq!(stats.hits + stats.misses, 800);
}
