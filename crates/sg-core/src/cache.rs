//! Fingerprint-keyed cache of analysis results
//!
//! Owned by whoever creates it and shared through `Arc`; there is no global
//! instance.

use crate::result::RelationshipAnalysisResult;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    result: RelationshipAnalysisResult,
    inserted_at: Instant,
}

/// Thread-safe analysis cache. Concurrent writers to one key: last write wins.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl AnalysisCache {
    /// A cache whose entries never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose entries expire `ttl` after insertion
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Look up a fresh entry. Expired entries are treated as missing.
    pub fn get(&self, fingerprint: &str) -> Option<RelationshipAnalysisResult> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        let entry = entries.get(fingerprint)?;
        if self.is_expired(entry) {
            log::debug!("Cache entry {} expired", short(fingerprint));
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn set(&self, fingerprint: impl Into<String>, result: RelationshipAnalysisResult) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if self.ttl.is_some() {
            entries.retain(|_, entry| !self.is_expired(entry));
        }
        entries.insert(
            fingerprint.into(),
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove one entry, returning whether it existed
    pub fn invalidate(&self, fingerprint: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.remove(fingerprint).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        let count = entries.len();
        entries.clear();
        log::debug!("Cleared {} cached analysis result(s)", count);
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
