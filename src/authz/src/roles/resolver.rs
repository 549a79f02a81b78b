//! Role resolver with per-subject caching
//!
//! The resolver memoises [`RoleGraph::resolve`] results keyed by subject. It never
//! touches the graph itself, so cached and uncached resolution always agree.
//!
//! # Thread Safety
//!
//! The cache is a `DashMap`, so concurrent `resolve` calls from many threads do not
//! contend on a single lock.

use super::graph::RoleGraph;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default maximum number of cached subjects
pub const DEFAULT_MAX_CACHED_SUBJECTS: usize = 1024;

/// Caching front-end over a [`RoleGraph`]
#[derive(Debug)]
pub struct RoleResolver {
    /// subject -> resolved roles
    cache: Option<DashMap<String, Arc<BTreeSet<String>>>>,

    /// Maximum cache size; new subjects are not admitted once reached
    max_cache_size: usize,
}

impl RoleResolver {
    /// Create a caching resolver with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CACHED_SUBJECTS)
    }

    /// Create a caching resolver holding at most `max_cache_size` subjects
    pub fn with_capacity(max_cache_size: usize) -> Self {
        Self {
            cache: Some(DashMap::new()),
            max_cache_size,
        }
    }

    /// Create a resolver that always walks the graph
    pub fn uncached() -> Self {
        Self {
            cache: None,
            max_cache_size: 0,
        }
    }

    /// Resolve the roles of `subject` in `graph`
    pub fn resolve(&self, graph: &RoleGraph, subject: &str) -> Arc<BTreeSet<String>> {
        let Some(cache) = &self.cache else {
            return Arc::new(graph.resolve(subject));
        };

        if let Some(cached) = cache.get(subject) {
            return Arc::clone(cached.value());
        }

        let resolved = Arc::new(graph.resolve(subject));

        if cache.len() < self.max_cache_size {
            cache.insert(subject.to_string(), Arc::clone(&resolved));
        }

        resolved
    }

    /// Drop every cached entry
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.cache.is_some(),
            size: self.cache.as_ref().map(DashMap::len).unwrap_or(0),
            max_size: self.max_cache_size,
        }
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Current cache size
    pub size: usize,
    /// Maximum cache size
    pub max_size: usize,
}
