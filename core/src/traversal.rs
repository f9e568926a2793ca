use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{AdjacencyCache, CacheStats};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::frontier::{expand, Frontier, VisitedMap};
use crate::node::{EntityId, Node, PathResult};
use crate::path::{describe_path, reconstruct, PathStep};
use crate::provider::{MetadataProvider, ProviderError};

/// One search direction: its current frontier, visited tree and depth.
struct Side {
    name: &'static str,
    frontier: Frontier,
    visited: VisitedMap,
    depth: u32,
}

impl Side {
    fn new(name: &'static str, root: Node) -> Self {
        Self {
            name,
            frontier: vec![root],
            visited: HashMap::from([(root, None)]),
            depth: 0,
        }
    }

    /// Advance one level against the other direction's visited tree.
    /// Returns the meeting node, if the new level touched the other tree.
    async fn advance(
        &mut self,
        cache: &AdjacencyCache,
        other: &VisitedMap,
        concurrency: usize,
    ) -> Result<Option<Node>, SearchError> {
        let expansion = expand(cache, &self.frontier, &mut self.visited, other, concurrency).await?;
        self.depth += 1;
        debug!(
            side = self.name,
            depth = self.depth,
            expanded = self.frontier.len(),
            discovered = expansion.next.len(),
            visited = self.visited.len(),
            "frontier expanded"
        );
        self.frontier = expansion.next;
        Ok(expansion.meeting)
    }
}

/// Shortest path between two people, at most `max_edges` edges long.
///
/// Runs a bidirectional BFS: each round expands the source side by one level,
/// then the target side by one level, checking for a meeting after each.
/// Both visited trees stay disjoint until the first meeting, and levels are
/// always expanded completely, so the first meeting found yields a path of
/// exactly the shortest distance.
///
/// Returns `Ok(None)` when no path of at most `max_edges` edges exists. A
/// person is always connected to itself, for any `max_edges`. Unknown people
/// fail with [`SearchError::NotFound`] before any expansion; the configured
/// timeout is checked between rounds only.
pub async fn find_path(
    cache: &AdjacencyCache,
    source: EntityId,
    target: EntityId,
    max_edges: u32,
    config: &SearchConfig,
) -> Result<Option<PathResult>, SearchError> {
    let source = Node::Person(source);
    let target = Node::Person(target);

    if source == target {
        return Ok(Some(PathResult::single(source)));
    }

    let started = Instant::now();
    let concurrency = config.effective_concurrency();

    futures::try_join!(resolve_root(cache, source), resolve_root(cache, target))?;

    let mut a = Side::new("source", source);
    let mut b = Side::new("target", target);
    let mut rounds = 0u32;

    loop {
        if let Some(timeout) = config.timeout {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(SearchError::Timeout { elapsed, rounds });
            }
        }

        for turn in [Turn::A, Turn::B] {
            // Each expansion adds one edge to the longest path we could find.
            if a.depth + b.depth >= max_edges {
                debug!(%source, %target, max_edges, rounds, "edge limit reached");
                return Ok(None);
            }

            let (side, other) = match turn {
                Turn::A => (&mut a, &b),
                Turn::B => (&mut b, &a),
            };
            if let Some(meeting) = side.advance(cache, &other.visited, concurrency).await? {
                let path = reconstruct(&a.visited, &b.visited, meeting);
                check_path(cache, &path);
                info!(
                    %source,
                    %target,
                    %meeting,
                    edges = path.edge_count(),
                    rounds = rounds + 1,
                    visited = a.visited.len() + b.visited.len(),
                    elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "path found"
                );
                return Ok(Some(path));
            }

            // An exhausted side has explored its whole component without
            // touching the other tree: the two people are not connected.
            if side.frontier.is_empty() {
                debug!(%source, %target, side = side.name, rounds, "frontier exhausted");
                return Ok(None);
            }
        }

        rounds += 1;
    }
}

#[derive(Clone, Copy)]
enum Turn {
    A,
    B,
}

async fn resolve_root(cache: &AdjacencyCache, root: Node) -> Result<(), SearchError> {
    match cache.neighbors(root).await {
        Ok(_) => Ok(()),
        Err(ProviderError::NotFound { .. }) => Err(SearchError::NotFound(root)),
        Err(source) => Err(SearchError::Provider { node: root, source }),
    }
}

#[cfg(debug_assertions)]
fn check_path(cache: &AdjacencyCache, path: &PathResult) {
    if let Err((from, to)) = crate::path::verify_edges(cache, path) {
        panic!("reconstructed path has a non-edge {} -> {}", from, to);
    }
}

#[cfg(not(debug_assertions))]
fn check_path(_cache: &AdjacencyCache, _path: &PathResult) {}

/// Long-lived search front end: one shared adjacency cache plus configuration.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct PathFinder {
    cache: Arc<AdjacencyCache>,
    config: SearchConfig,
}

impl PathFinder {
    pub fn new(provider: Arc<dyn MetadataProvider>, config: SearchConfig) -> Self {
        let cache = Arc::new(AdjacencyCache::new(provider, config.cache_capacity));
        Self { cache, config }
    }

    /// Use an existing cache (for example one shared with other finders).
    pub fn with_cache(cache: Arc<AdjacencyCache>, config: SearchConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &Arc<AdjacencyCache> {
        &self.cache
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// See [`find_path`].
    pub async fn find_path(
        &self,
        source: EntityId,
        target: EntityId,
        max_edges: u32,
    ) -> Result<Option<PathResult>, SearchError> {
        find_path(&self.cache, source, target, max_edges, &self.config).await
    }

    /// [`find_path`] limited to the configured `max_edges`.
    pub async fn find(
        &self,
        source: EntityId,
        target: EntityId,
    ) -> Result<Option<PathResult>, SearchError> {
        self.find_path(source, target, self.config.max_edges).await
    }

    /// Labels for every node of `path`.
    pub async fn describe(&self, path: &PathResult) -> Result<Vec<PathStep>, ProviderError> {
        describe_path(
            self.cache.provider().as_ref(),
            path,
            self.config.effective_concurrency(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::graph::MemoryGraph;

    fn finder(graph: MemoryGraph) -> (Arc<MemoryGraph>, PathFinder) {
        let graph = Arc::new(graph);
        let finder = PathFinder::new(graph.clone(), SearchConfig::default().with_concurrency(4));
        (graph, finder)
    }

    /// Person(1)-Movie(10)-Person(2)-Movie(20)-Person(3)
    fn make_scenario() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        g.add_credit(1, 10);
        g.add_credit(2, 10);
        g.add_credit(2, 20);
        g.add_credit(3, 20);
        g
    }

    /// People 0..n, person i and i+1 share movie 1000+i.
    fn make_chain(people: u64) -> MemoryGraph {
        let mut g = MemoryGraph::new();
        for i in 0..people {
            g.add_person(i, format!("P{}", i));
        }
        for i in 0..people.saturating_sub(1) {
            g.add_credit(i, 1000 + i);
            g.add_credit(i + 1, 1000 + i);
        }
        g
    }

    fn assert_valid(graph: &MemoryGraph, path: &PathResult) {
        assert!(path.is_alternating(), "path does not alternate: {:?}", path);
        for w in path.nodes().windows(2) {
            let adjacent = graph.adjacent(w[0]).unwrap_or_default();
            assert!(adjacent.contains(&w[1]), "{} -> {} is not an edge", w[0], w[1]);
        }
    }

    /// Plain single-source BFS distance, in edges.
    fn oracle_distance(graph: &MemoryGraph, source: Node, target: Node) -> Option<usize> {
        let mut dist: HashMap<Node, usize> = HashMap::from([(source, 0)]);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            if node == target {
                return Some(dist[&node]);
            }
            for next in graph.adjacent(node).unwrap_or_default() {
                if !dist.contains_key(&next) {
                    dist.insert(next, dist[&node] + 1);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    // --- Scenario tests ---

    #[tokio::test]
    async fn test_scenario_chain_found() {
        let (_, finder) = finder(make_scenario());
        let path = finder.find_path(1, 3, 4).await.unwrap().unwrap();
        assert_eq!(
            path.nodes(),
            &[
                Node::Person(1),
                Node::Movie(10),
                Node::Person(2),
                Node::Movie(20),
                Node::Person(3)
            ]
        );
    }

    #[tokio::test]
    async fn test_scenario_edge_limit() {
        let (_, finder) = finder(make_scenario());
        assert!(finder.find_path(1, 3, 2).await.unwrap().is_none());
        assert!(finder.find_path(1, 3, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_self_path_any_limit() {
        let (graph, finder) = finder(make_scenario());
        for max_edges in [0, 1, 6] {
            let path = finder.find_path(2, 2, max_edges).await.unwrap().unwrap();
            assert_eq!(path.nodes(), &[Node::Person(2)]);
        }
        // Never touches the provider, even for unknown ids.
        assert!(finder.find_path(99, 99, 0).await.unwrap().is_some());
        assert_eq!(graph.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_direct_costars() {
        let (graph, finder) = finder(make_scenario());
        let path = finder.find_path(2, 3, 6).await.unwrap().unwrap();
        assert_eq!(path.nodes(), &[Node::Person(2), Node::Movie(20), Node::Person(3)]);
        assert_valid(&graph, &path);
    }

    #[tokio::test]
    async fn test_max_edges_zero() {
        let (_, finder) = finder(make_scenario());
        assert!(finder.find_path(1, 2, 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_long_chain() {
        let (graph, finder) = finder(make_chain(8));
        let path = finder.find_path(0, 7, 14).await.unwrap().unwrap();
        assert_eq!(path.edge_count(), 14);
        assert_eq!(path.movie_hops(), 7);
        assert_valid(&graph, &path);

        assert!(finder.find_path(0, 7, 13).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disconnected_is_no_path() {
        let mut g = make_scenario();
        g.add_credit(4, 40);
        g.add_credit(5, 40);
        let (_, finder) = finder(g);
        assert!(finder.find_path(1, 5, 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_isolated_person_is_no_path() {
        let mut g = make_scenario();
        g.add_person(9, "Nobody");
        let (_, finder) = finder(g);
        assert!(finder.find_path(1, 9, 10).await.unwrap().is_none());
        assert!(finder.find_path(9, 1, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shortcut_preferred() {
        // Long route 1-10-2-20-3-30-4 plus a shared movie 50 for 1 and 4.
        let mut g = MemoryGraph::new();
        for (p, m) in [(1, 10), (2, 10), (2, 20), (3, 20), (3, 30), (4, 30), (1, 50), (4, 50)] {
            g.add_credit(p, m);
        }
        let (graph, finder) = finder(g);
        let path = finder.find_path(1, 4, 10).await.unwrap().unwrap();
        assert_eq!(path.nodes(), &[Node::Person(1), Node::Movie(50), Node::Person(4)]);
        assert_valid(&graph, &path);
    }

    #[tokio::test]
    async fn test_tie_broken_by_lowest_id() {
        // Persons 1 and 2 share movies 30 and 20; the lower id wins.
        let mut g = MemoryGraph::new();
        for m in [30, 20] {
            g.add_credit(1, m);
            g.add_credit(2, m);
        }
        let (_, finder) = finder(g);
        let path = finder.find_path(1, 2, 2).await.unwrap().unwrap();
        assert_eq!(path.nodes()[1], Node::Movie(20));
    }

    // --- Failure handling ---

    #[tokio::test]
    async fn test_unknown_source_not_found() {
        let (_, finder) = finder(make_scenario());
        let err = finder.find_path(404, 1, 6).await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound(Node::Person(404))));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unknown_target_not_found_even_with_zero_limit() {
        let (_, finder) = finder(make_scenario());
        let err = finder.find_path(1, 404, 0).await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound(Node::Person(404))));
    }

    #[tokio::test]
    async fn test_transient_failure_fails_search_without_caching() {
        let (graph, finder) = finder(make_scenario());
        graph.fail_next(Node::Movie(10), ProviderError::Network("connection reset".into()));

        let err = finder.find_path(1, 3, 4).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.node(), Some(Node::Movie(10)));
        assert!(!finder.cache().contains(Node::Movie(10)));

        // The next attempt fetches the node again and succeeds.
        let path = finder.find_path(1, 3, 4).await.unwrap().unwrap();
        assert_eq!(path.edge_count(), 4);
    }

    #[tokio::test]
    async fn test_invalid_response_is_fatal() {
        let (graph, finder) = finder(make_scenario());
        graph.fail_next(Node::Movie(20), ProviderError::InvalidResponse("truncated".into()));
        let err = finder.find_path(1, 3, 4).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Provider {
                source: ProviderError::InvalidResponse(_),
                ..
            }
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_root_transient_failure_is_provider_error() {
        let (graph, finder) = finder(make_scenario());
        graph.fail_next(Node::Person(1), ProviderError::RateLimited { retry_after: None });
        let err = finder.find_path(1, 3, 4).await.unwrap_err();
        assert!(matches!(err, SearchError::Provider { node: Node::Person(1), .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_between_rounds() {
        let graph = Arc::new(make_chain(10).with_latency(Duration::from_millis(100)));
        let config = SearchConfig::default().with_timeout(Duration::from_millis(150));
        let finder = PathFinder::new(graph, config);

        let err = finder.find_path(0, 9, 18).await.unwrap_err();
        match err {
            SearchError::Timeout { rounds, elapsed } => {
                // Roots resolve together (100ms) and warm the first round;
                // the second round fetches both movies (200ms more).
                assert_eq!(rounds, 2);
                assert!(elapsed >= Duration::from_millis(150));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_timeout_fails_before_first_round() {
        let graph = Arc::new(make_scenario());
        let config = SearchConfig::default().with_timeout(Duration::ZERO);
        let finder = PathFinder::new(graph, config);
        let err = finder.find_path(1, 3, 4).await.unwrap_err();
        assert!(matches!(err, SearchError::Timeout { rounds: 0, .. }));
    }

    // --- Caching behavior ---

    #[tokio::test]
    async fn test_idempotent_on_warm_cache() {
        let (graph, finder) = finder(make_chain(6));
        let first = finder.find_path(0, 5, 10).await.unwrap();
        let fetched = graph.fetch_count();
        let second = finder.find_path(0, 5, 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.fetch_count(), fetched, "warm search hit the provider");
        assert!(finder.cache_stats().hits > 0);
    }

    #[tokio::test]
    async fn test_shared_cache_across_finders() {
        let graph = Arc::new(make_chain(5));
        let one = PathFinder::new(graph.clone(), SearchConfig::default());
        let two = PathFinder::with_cache(one.cache().clone(), SearchConfig::default());

        one.find_path(0, 4, 8).await.unwrap().unwrap();
        let fetched = graph.fetch_count();
        two.find_path(0, 4, 8).await.unwrap().unwrap();
        assert_eq!(graph.fetch_count(), fetched);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_searches_share_small_cache() {
        let graph = Arc::new(make_chain(50));
        let config = SearchConfig::default().with_cache_capacity(NonZeroUsize::new(8).unwrap());
        let finder = PathFinder::new(graph.clone(), config);

        let handles: Vec<_> = (0..16u64)
            .map(|k| {
                let finder = finder.clone();
                tokio::spawn(async move { (k, finder.find_path(k, 49 - k, 200).await) })
            })
            .collect();

        for handle in handles {
            let (k, result) = handle.await.unwrap();
            let path = result.unwrap().expect("chain is connected");
            let expected = oracle_distance(&graph, Node::Person(k), Node::Person(49 - k));
            assert_eq!(Some(path.edge_count()), expected, "search {} -> {}", k, 49 - k);
            assert_valid(&graph, &path);
        }

        let stats = finder.cache_stats();
        assert!(stats.entries <= 8);
        assert!(stats.evictions > 0);
    }

    #[tokio::test]
    async fn test_find_uses_configured_limit() {
        let graph = Arc::new(make_scenario());
        let short = PathFinder::new(graph.clone(), SearchConfig::default().with_max_edges(3));
        assert!(short.find(1, 3).await.unwrap().is_none());

        let default = PathFinder::new(graph, SearchConfig::default());
        let path = default.find(1, 3).await.unwrap().unwrap();
        assert_eq!(path.edge_count(), 4);
    }

    #[tokio::test]
    async fn test_tiny_cache_still_correct() {
        let graph = Arc::new(make_chain(7));
        let finder = PathFinder::new(graph.clone(), SearchConfig::default().with_cache_capacity(NonZeroUsize::MIN));
        let path = finder.find_path(0, 6, 12).await.unwrap().unwrap();
        assert_eq!(path.edge_count(), 12);
        assert_valid(&graph, &path);
        assert_eq!(finder.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_describe_found_path() {
        let mut g = make_scenario();
        g.add_person(1, "Ann");
        g.add_movie(10, "First", Some(2001));
        let (_, finder) = finder(g);
        let path = finder.find_path(1, 2, 2).await.unwrap().unwrap();
        let steps = finder.describe(&path).await.unwrap();
        let labels: Vec<String> = steps.into_iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["Ann", "First (2001)", "Person 2"]);
    }

    // --- Oracle comparison ---

    fn bipartite(credits: &[(u64, u64)], people: u64) -> MemoryGraph {
        let mut g = MemoryGraph::new();
        for p in 0..people {
            g.add_person(p, format!("P{}", p));
        }
        let unique: HashSet<(u64, u64)> = credits.iter().copied().collect();
        for (p, m) in unique {
            g.add_credit(p % people, 100 + m);
        }
        g
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_matches_bfs_oracle(
            credits in prop::collection::vec((0u64..8, 0u64..6), 0..24),
            source in 0u64..8,
            target in 0u64..8,
            max_edges in 0u32..12,
        ) {
            let graph = Arc::new(bipartite(&credits, 8));
            let finder = PathFinder::new(graph.clone(), SearchConfig::default().with_concurrency(3));
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            let result = runtime.block_on(finder.find_path(source, target, max_edges)).unwrap();
            let expected = oracle_distance(&graph, Node::Person(source), Node::Person(target))
                .filter(|&d| d <= max_edges as usize);

            match (result, expected) {
                (Some(path), Some(distance)) => {
                    prop_assert_eq!(path.edge_count(), distance);
                    prop_assert_eq!(path.source(), Node::Person(source));
                    prop_assert_eq!(path.target(), Node::Person(target));
                    assert_valid(&graph, &path);
                }
                (None, None) => {}
                (got, want) => prop_assert!(false, "got {:?}, oracle distance {:?}", got, want),
            }
        }
    }
}
