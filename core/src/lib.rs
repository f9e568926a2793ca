//! actor-link-core: shortest connections between people through the movies
//! they appeared in.
//!
//! The person/movie graph is never loaded up front. Adjacency lists are
//! fetched lazily from a [`MetadataProvider`] through a bounded LRU
//! [`AdjacencyCache`], and a level-synchronized bidirectional BFS expands
//! from both people until the two search trees meet.
//!
//! No HTTP dependencies: the TMDb provider lives in `actor-link-tmdb`, and
//! [`MemoryGraph`] serves tests and benchmarks.

mod cache;
mod config;
mod error;
mod frontier;
mod graph;
mod node;
mod path;
mod provider;
mod traversal;

pub use cache::{AdjacencyCache, CacheStats, Neighbors};
pub use config::{
    max_edges_for_movie_hops, SearchConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CONCURRENCY,
    DEFAULT_MAX_EDGES, MAX_CONCURRENCY,
};
pub use error::SearchError;
pub use frontier::{expand, Expansion, Frontier, VisitedMap};
pub use graph::{Credit, MemoryGraph};
pub use node::{EntityId, Node, NodeKind, PathResult};
pub use path::{describe_path, reconstruct, verify_edges, PathStep};
pub use provider::{MetadataProvider, MovieDetail, PersonDetail, ProviderError};
pub use traversal::{find_path, PathFinder};
