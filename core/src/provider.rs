//! The I/O boundary: everything the search knows about the graph comes
//! through a [`MetadataProvider`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{EntityId, Node, NodeKind};

/// Failure reported by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{kind} {id} not found")]
    NotFound { kind: NodeKind, id: EntityId },

    #[error("rate limited by provider (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn not_found(node: Node) -> Self {
        ProviderError::NotFound {
            kind: node.kind(),
            id: node.id(),
        }
    }

    /// Transient failures that may succeed if the same request is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Network(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDetail {
    pub name: String,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub title: String,
    pub release_year: Option<i32>,
    pub poster_path: Option<String>,
}

impl MovieDetail {
    /// `"Title (Year)"`, or just the title when the year is unknown.
    pub fn display_title(&self) -> String {
        match self.release_year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// Source of adjacency lists and entity details.
///
/// Adjacency results are sets: order and duplicates carry no meaning, the
/// adjacency cache normalizes them.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Ids of the movies a person appears in.
    async fn person_movie_ids(&self, person_id: EntityId) -> Result<Vec<EntityId>, ProviderError>;

    /// Ids of the people in a movie's cast.
    async fn movie_cast_ids(&self, movie_id: EntityId) -> Result<Vec<EntityId>, ProviderError>;

    async fn person_detail(&self, person_id: EntityId) -> Result<PersonDetail, ProviderError>;

    async fn movie_detail(&self, movie_id: EntityId) -> Result<MovieDetail, ProviderError>;

    /// Raw neighbor ids of `node`, dispatched on its kind.
    async fn neighbor_ids(&self, node: Node) -> Result<Vec<EntityId>, ProviderError> {
        match node {
            Node::Person(id) => self.person_movie_ids(id).await,
            Node::Movie(id) => self.movie_cast_ids(id).await,
        }
    }
}
