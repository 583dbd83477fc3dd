use super::*;
use std::sync::Arc;

fn result(message: &str) -> RelationshipAnalysisResult {
    RelationshipAnalysisResult::failure(message, Vec::new(), Duration::ZERO)
}

#[test]
fn test_get_missing() {
    let cache = AnalysisCache::new();
    assert!(cache.get("abc").is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_set_then_get() {
    let cache = AnalysisCache::new();
    cache.set("abc", result("first"));
    let cached = cache.get("abc").unwrap();
    assert_eq!(cached.errors, vec!["first"]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_last_write_wins() {
    let cache = AnalysisCache::new();
    cache.set("abc", result("first"));
    cache.set("abc", result("second"));
    assert_eq!(cache.get("abc").unwrap().errors, vec!["second"]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_clear_and_invalidate() {
    let cache = AnalysisCache::new();
    cache.set("a", result("a"));
    cache.set("b", result("b"));
    assert!(cache.invalidate("a"));
    assert!(!cache.invalidate("a"));
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get("b").is_none());
}

#[test]
fn test_ttl_expiry() {
    let cache = AnalysisCache::with_ttl(Duration::ZERO);
    cache.set("abc", result("stale"));
    assert!(cache.get("abc").is_none());
    assert_eq!(cache.ttl(), Some(Duration::ZERO));
}

#[test]
fn test_long_ttl_keeps_entries() {
    let cache = AnalysisCache::with_ttl(Duration::from_secs(3600));
    cache.set("abc", result("fresh"));
    assert!(cache.get("abc").is_some());
}

#[test]
fn test_concurrent_access() {
    let cache = Arc::new(AnalysisCache::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                cache.set(format!("key-{}", i % 2), result(&format!("writer-{}", i)));
                cache.get("key-0").is_some() || cache.get("key-1").is_some()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(cache.len(), 2);
}
