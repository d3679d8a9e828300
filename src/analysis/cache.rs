use std::num::NonZeroUsize;

use log::debug;
use lru::LruCache;

use super::graph::CollaborationGraph;
use super::selection::InclusionSet;

/// Graphs kept per session before the least recently used one is dropped.
pub const DEFAULT_GRAPH_CACHE_CAPACITY: usize = 10;

/// What a collaboration graph was built from.
///
/// `generation` changes whenever the population or the graph settings do,
/// so a key never matches a graph built from older inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphCacheKey {
    pub selection: InclusionSet,
    pub generation: u64,
}

/// Manages caching of collaboration graphs
#[derive(Debug)]
pub struct CacheManager {
    cache: LruCache<GraphCacheKey, CollaborationGraph>,
}

impl CacheManager {
    /// Create a cache holding up to [`DEFAULT_GRAPH_CACHE_CAPACITY`] graphs
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_GRAPH_CACHE_CAPACITY)
    }

    /// Create a cache holding up to `capacity` graphs; zero is treated as one
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Store a graph, evicting the least recently used one when full
    pub fn store(&mut self, key: GraphCacheKey, graph: CollaborationGraph) {
        if let Some((evicted, _)) = self.cache.push(key, graph) {
            debug!("graph cache evicted generation {}", evicted.generation);
        }
    }

    /// Look up a graph without refreshing its recency
    pub fn get(&self, key: &GraphCacheKey) -> Option<&CollaborationGraph> {
        self.cache.peek(key)
    }

    /// Returns the cached graph for `key`, building and storing it on a miss.
    /// Nothing is stored when `build` fails.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: GraphCacheKey, build: F) -> Result<&CollaborationGraph, E>
    where
        F: FnOnce() -> Result<CollaborationGraph, E>,
    {
        let built = if self.cache.contains(&key) {
            debug!("graph cache hit (generation {})", key.generation);
            None
        } else {
            debug!(
                "graph cache miss (generation {}, {} selected)",
                key.generation,
                key.selection.selected_count()
            );
            Some(build()?)
        };
        Ok(self.cache.get_or_insert(key, || built.unwrap_or_default()))
    }

    /// Number of cached graphs
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no graph is cached
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Most graphs kept at once
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}
