//! Bounded LRU memo of node -> neighbor lookups in front of a provider.
//!
//! The cache holds one entry per resolved node, regardless of kind: people and
//! movies share the same capacity. Only successful lookups are stored. A
//! failed fetch leaves no trace, so the node is fetched again on its next
//! visit instead of being remembered as having no neighbors.
//!
//! The map is guarded by a mutex that is never held across a provider call.
//! Two concurrent misses on the same node may both reach the provider; the
//! second insert simply refreshes the entry.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::node::Node;
use crate::provider::{MetadataProvider, ProviderError};

/// Neighbor list of one node, sorted by id, free of duplicates.
pub type Neighbors = Arc<[Node]>;

/// Point-in-time counters for an [`AdjacencyCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct AdjacencyCache {
    provider: Arc<dyn MetadataProvider>,
    entries: Mutex<LruCache<Node, Neighbors>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl AdjacencyCache {
    pub fn new(provider: Arc<dyn MetadataProvider>, capacity: NonZeroUsize) -> Self {
        Self {
            provider,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cache with the default capacity of 10,000 entries.
    pub fn with_default_capacity(provider: Arc<dyn MetadataProvider>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::new(provider, capacity)
    }

    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    /// Neighbors of `node`, fetched from the provider on a miss.
    ///
    /// Neighbors always have the opposite kind of `node`.
    pub async fn neighbors(&self, node: Node) -> Result<Neighbors, ProviderError> {
        let cached = self.entries.lock().get(&node).cloned();
        if let Some(hit) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let ids = self.provider.neighbor_ids(node).await?;
        let kind = node.kind().opposite();
        let mut neighbors: Vec<Node> = ids.into_iter().map(|id| kind.node(id)).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        let neighbors: Neighbors = neighbors.into();

        trace!(%node, count = neighbors.len(), "adjacency cache fill");
        self.insert(node, neighbors.clone());
        Ok(neighbors)
    }

    /// Cached neighbors without touching the provider or the recency order.
    pub fn peek(&self, node: Node) -> Option<Neighbors> {
        self.entries.lock().peek(&node).cloned()
    }

    pub fn contains(&self, node: Node) -> bool {
        self.entries.lock().contains(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn insert(&self, node: Node, neighbors: Neighbors) {
        // push() evicts under the same lock that inserts.
        if let Some((evicted, _)) = self.entries.lock().push(node, neighbors) {
            if evicted != node {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(node = %evicted, "adjacency cache eviction");
            }
        }
    }
}
