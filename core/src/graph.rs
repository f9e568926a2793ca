use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::node::{EntityId, Node};
use crate::provider::{MetadataProvider, MovieDetail, PersonDetail, ProviderError};

/// A credit row: person appears in movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub person_id: EntityId,
    pub movie_id: EntityId,
}

/// In-memory person/movie graph that serves as a [`MetadataProvider`].
///
/// Credits are stored in both directions: `person_movies[p]` holds the movies
/// of p, `movie_cast[m]` the cast of m. Both are populated on insert.
/// Used as the provider for tests and benchmarks, and as a reference adjacency
/// table for checking search results.
#[derive(Default)]
pub struct MemoryGraph {
    person_movies: HashMap<EntityId, BTreeSet<EntityId>>,
    movie_cast: HashMap<EntityId, BTreeSet<EntityId>>,
    people: HashMap<EntityId, PersonDetail>,
    movies: HashMap<EntityId, MovieDetail>,
    latency: Option<Duration>,
    /// Errors returned (in order) by the next adjacency fetches of a node.
    injected: Mutex<HashMap<Node, VecDeque<ProviderError>>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(people: usize, movies: usize) -> Self {
        Self {
            person_movies: HashMap::with_capacity(people),
            movie_cast: HashMap::with_capacity(movies),
            people: HashMap::with_capacity(people),
            movies: HashMap::with_capacity(movies),
            ..Self::default()
        }
    }

    /// Delay every adjacency fetch by `latency` (simulates network round trips).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register a person, even one with no credits.
    pub fn add_person(&mut self, id: EntityId, name: impl Into<String>) {
        self.person_movies.entry(id).or_default();
        self.people.insert(
            id,
            PersonDetail {
                name: name.into(),
                birthday: None,
                deathday: None,
                profile_path: None,
            },
        );
    }

    /// Register a movie, even one with an empty cast.
    pub fn add_movie(&mut self, id: EntityId, title: impl Into<String>, release_year: Option<i32>) {
        self.movie_cast.entry(id).or_default();
        self.movies.insert(
            id,
            MovieDetail {
                title: title.into(),
                release_year,
                poster_path: None,
            },
        );
    }

    /// Record that `person_id` appears in `movie_id`. Creates both ends if missing.
    pub fn add_credit(&mut self, person_id: EntityId, movie_id: EntityId) {
        self.person_movies.entry(person_id).or_default().insert(movie_id);
        self.movie_cast.entry(movie_id).or_default().insert(person_id);
    }

    /// Bulk load credit rows.
    pub fn load_credits<I>(&mut self, credits: I)
    where
        I: IntoIterator<Item = Credit>,
    {
        for c in credits {
            self.add_credit(c.person_id, c.movie_id);
        }
    }

    /// Make the next adjacency fetch of `node` fail with `error`.
    /// Calling repeatedly queues several failures.
    pub fn fail_next(&self, node: Node, error: ProviderError) {
        self.injected.lock().entry(node).or_default().push_back(error);
    }

    /// Synchronous adjacency lookup, sorted by id. None if the node is unknown.
    pub fn adjacent(&self, node: Node) -> Option<Vec<Node>> {
        let ids = match node {
            Node::Person(id) => self.person_movies.get(&id)?,
            Node::Movie(id) => self.movie_cast.get(&id)?,
        };
        let kind = node.kind().opposite();
        Some(ids.iter().map(|&id| kind.node(id)).collect())
    }

    pub fn contains(&self, node: Node) -> bool {
        match node {
            Node::Person(id) => self.person_movies.contains_key(&id),
            Node::Movie(id) => self.movie_cast.contains_key(&id),
        }
    }

    pub fn person_count(&self) -> usize {
        self.person_movies.len()
    }

    pub fn movie_count(&self) -> usize {
        self.movie_cast.len()
    }

    /// Number of distinct credits (person-movie edges).
    pub fn edge_count(&self) -> usize {
        self.person_movies.values().map(|m| m.len()).sum()
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        // BTreeSet overhead is roughly 2x the payload for small sets.
        let keys = (self.person_movies.len() + self.movie_cast.len()) * (size_of::<EntityId>() + 48);
        let edges = self.edge_count() * 2 * size_of::<EntityId>() * 2;
        let details = (self.people.len() + self.movies.len()) * 96;

        keys + edges + details
    }

    /// Total adjacency fetches served, including injected failures.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Highest number of adjacency fetches that were running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    async fn fetch(&self, node: Node) -> Result<Vec<EntityId>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let result = self.lookup(node);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn lookup(&self, node: Node) -> Result<Vec<EntityId>, ProviderError> {
        if let Some(err) = self
            .injected
            .lock()
            .get_mut(&node)
            .and_then(|queue| queue.pop_front())
        {
            return Err(err);
        }

        let ids = match node {
            Node::Person(id) => self.person_movies.get(&id),
            Node::Movie(id) => self.movie_cast.get(&id),
        };
        ids.map(|set| set.iter().copied().collect())
            .ok_or_else(|| ProviderError::not_found(node))
    }
}

#[async_trait]
impl MetadataProvider for MemoryGraph {
    async fn person_movie_ids(&self, person_id: EntityId) -> Result<Vec<EntityId>, ProviderError> {
        self.fetch(Node::Person(person_id)).await
    }

    async fn movie_cast_ids(&self, movie_id: EntityId) -> Result<Vec<EntityId>, ProviderError> {
        self.fetch(Node::Movie(movie_id)).await
    }

    async fn person_detail(&self, person_id: EntityId) -> Result<PersonDetail, ProviderError> {
        if let Some(detail) = self.people.get(&person_id) {
            return Ok(detail.clone());
        }
        if self.person_movies.contains_key(&person_id) {
            return Ok(PersonDetail {
                name: format!("Person {}", person_id),
                birthday: None,
                deathday: None,
                profile_path: None,
            });
        }
        Err(ProviderError::not_found(Node::Person(person_id)))
    }

    async fn movie_detail(&self, movie_id: EntityId) -> Result<MovieDetail, ProviderError> {
        if let Some(detail) = self.movies.get(&movie_id) {
            return Ok(detail.clone());
        }
        if self.movie_cast.contains_key(&movie_id) {
            return Ok(MovieDetail {
                title: format!("Movie {}", movie_id),
                release_year: None,
                poster_path: None,
            });
        }
        Err(ProviderError::not_found(Node::Movie(movie_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credits_are_bidirectional() {
        let mut g = MemoryGraph::new();
        g.add_credit(1, 10);
        g.add_credit(2, 10);
        g.add_credit(1, 11);

        assert_eq!(g.adjacent(Node::Person(1)), Some(vec![Node::Movie(10), Node::Movie(11)]));
        assert_eq!(g.adjacent(Node::Movie(10)), Some(vec![Node::Person(1), Node::Person(2)]));
        assert_eq!(g.person_count(), 2);
        assert_eq!(g.movie_count(), 2);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_duplicate_credit_ignored() {
        let mut g = MemoryGraph::new();
        g.load_credits(vec![
            Credit { person_id: 1, movie_id: 10 },
            Credit { person_id: 1, movie_id: 10 },
        ]);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_unknown_node() {
        let g = MemoryGraph::new();
        assert!(g.adjacent(Node::Person(1)).is_none());
        assert!(!g.contains(Node::Movie(1)));
    }

    #[test]
    fn test_memory_usage_nonzero() {
        let mut g = MemoryGraph::new();
        g.add_credit(1, 10);
        assert!(g.memory_usage() > 0);
    }

    #[tokio::test]
    async fn test_fetch_unknown_is_not_found() {
        let g = MemoryGraph::new();
        let err = g.person_movie_ids(99).await.unwrap_err();
        assert_eq!(err, ProviderError::not_found(Node::Person(99)));
    }

    #[tokio::test]
    async fn test_person_without_credits_has_empty_adjacency() {
        let mut g = MemoryGraph::new();
        g.add_person(7, "Loner");
        assert_eq!(g.person_movie_ids(7).await.unwrap(), Vec::<EntityId>::new());
        assert_eq!(g.person_detail(7).await.unwrap().name, "Loner");
    }

    #[tokio::test]
    async fn test_injected_failure_consumed_once() {
        let mut g = MemoryGraph::new();
        g.add_credit(1, 10);
        g.fail_next(Node::Movie(10), ProviderError::Network("reset".into()));

        assert!(g.movie_cast_ids(10).await.is_err());
        assert_eq!(g.movie_cast_ids(10).await.unwrap(), vec![1]);
        assert_eq!(g.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_detail_fallback_labels() {
        let mut g = MemoryGraph::new();
        g.add_credit(1, 10);
        g.add_movie(11, "Heat", Some(1995));
        assert_eq!(g.person_detail(1).await.unwrap().name, "Person 1");
        assert_eq!(g.movie_detail(10).await.unwrap().title, "Movie 10");
        assert_eq!(g.movie_detail(11).await.unwrap().display_title(), "Heat (1995)");
        assert!(g.movie_detail(12).await.is_err());
    }
}
