//! Association Cache - lazy per-instance result memoization
//!
//! This is a correctness cache, not a performance cache: entries have no
//! TTL, no memory bound, and no eviction policy. A cached result lives until
//! the owning instance is invalidated (field reassignment or explicit
//! reload) or the cache is cleared. Last write wins if two callers race to
//! resolve the same key.

use std::sync::RwLock;

use dashmap::DashMap;

use crate::resolver::ResolvedAssociation;

/// Cache key: instance identity plus association name
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    entity: String,
    instance_id: String,
    association: String,
}

impl CacheKey {
    fn new(entity: &str, instance_id: &str, association: &str) -> Self {
        Self {
            entity: entity.to_string(),
            instance_id: instance_id.to_string(),
            association: association.to_string(),
        }
    }
}

/// Thread-safe cache of resolved association results
#[derive(Debug, Default)]
pub struct AssociationCache {
    entries: DashMap<CacheKey, ResolvedAssociation>,
    metrics: RwLock<CacheMetrics>,
}

impl AssociationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a memoized result
    pub fn get(
        &self,
        entity: &str,
        instance_id: &str,
        association: &str,
    ) -> Option<ResolvedAssociation> {
        let key = CacheKey::new(entity, instance_id, association);
        let found = self.entries.get(&key).map(|entry| entry.clone());

        if let Ok(mut metrics) = self.metrics.write() {
            if found.is_some() {
                metrics.hits += 1;
            } else {
                metrics.misses += 1;
            }
        }

        found
    }

    /// Store a resolved result, replacing any previous entry
    pub fn store(
        &self,
        entity: &str,
        instance_id: &str,
        association: &str,
        result: ResolvedAssociation,
    ) {
        let key = CacheKey::new(entity, instance_id, association);
        self.entries.insert(key, result);

        if let Ok(mut metrics) = self.metrics.write() {
            metrics.stores += 1;
        }
    }

    /// Drop one cached association for an instance
    pub fn invalidate(&self, entity: &str, instance_id: &str, association: &str) -> bool {
        let key = CacheKey::new(entity, instance_id, association);
        self.entries.remove(&key).is_some()
    }

    /// Drop all cached associations for an instance
    pub fn invalidate_instance(&self, entity: &str, instance_id: &str) {
        self.entries
            .retain(|key, _| !(key.entity == entity && key.instance_id == instance_id));
    }

    /// Drop every cached result
    pub fn clear_all(&self) {
        self.entries.clear();
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        let metrics = self
            .metrics
            .read()
            .map(|m| m.clone())
            .unwrap_or_default();
        let total = metrics.hits + metrics.misses;
        CacheStats {
            entries: self.entries.len(),
            hits: metrics.hits,
            misses: metrics.misses,
            stores: metrics.stores,
            hit_rate: if total > 0 {
                metrics.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// Internal hit/miss/store counters
#[derive(Debug, Clone, Default)]
struct CacheMetrics {
    hits: usize,
    misses: usize,
    stores: usize,
}

/// Public cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub stores: usize,
    pub hit_rate: f64,
}
