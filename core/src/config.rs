use std::num::NonZeroUsize;
use std::time::Duration;

/// Default number of adjacency entries kept by the cache (people and movies combined).
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default number of neighbor fetches in flight during one expansion.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Upper bound on fetch concurrency, to stay within provider rate limits.
pub const MAX_CONCURRENCY: usize = 64;

/// Default maximum path length in edges (three movies between the two people).
pub const DEFAULT_MAX_EDGES: u32 = 6;

/// Path length in edges that allows `movie_hops` movies between the endpoints.
pub fn max_edges_for_movie_hops(movie_hops: u32) -> u32 {
    movie_hops.saturating_mul(2)
}

/// Tunables for a [`crate::PathFinder`] and the searches it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub cache_capacity: NonZeroUsize,
    /// Path length limit used by [`crate::PathFinder::find`].
    pub max_edges: u32,
    /// Neighbor fetches allowed in flight at once, within 1..=MAX_CONCURRENCY.
    pub concurrency: usize,
    /// Deadline for a whole search, checked between rounds.
    pub timeout: Option<Duration>,
}

impl SearchConfig {
    pub fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_max_edges(mut self, max_edges: u32) -> Self {
        self.max_edges = max_edges;
        self
    }

    /// Fetch concurrency, clamped to 1..=MAX_CONCURRENCY.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            max_edges: DEFAULT_MAX_EDGES,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.cache_capacity.get(), 10_000);
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.max_edges, max_edges_for_movie_hops(3));
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_concurrency_clamped() {
        assert_eq!(SearchConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(SearchConfig::default().with_concurrency(500).concurrency, MAX_CONCURRENCY);
        assert_eq!(SearchConfig::default().with_concurrency(8).concurrency, 8);
    }

    #[test]
    fn test_builder_overrides() {
        let config = SearchConfig::default()
            .with_cache_capacity(NonZeroUsize::MIN)
            .with_max_edges(10);
        assert_eq!(config.cache_capacity.get(), 1);
        assert_eq!(config.max_edges, 10);
    }

    #[test]
    fn test_movie_hops_to_edges() {
        assert_eq!(max_edges_for_movie_hops(3), 6);
        assert_eq!(max_edges_for_movie_hops(0), 0);
        assert_eq!(max_edges_for_movie_hops(u32::MAX), u32::MAX);
    }
}
