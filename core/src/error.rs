use std::time::Duration;

use thiserror::Error;

use crate::node::Node;
use crate::provider::ProviderError;

/// Why a search ended without a result.
///
/// Not finding a path within the edge limit is not an error: searches
/// report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0} could not be resolved by the metadata provider")]
    NotFound(Node),

    #[error("search timed out after {rounds} rounds ({elapsed:?})")]
    Timeout { elapsed: Duration, rounds: u32 },

    #[error("failed to resolve neighbors of {node}: {source}")]
    Provider {
        node: Node,
        #[source]
        source: ProviderError,
    },
}

impl SearchError {
    /// True when repeating the same search may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Provider { source, .. } => source.is_retryable(),
            SearchError::NotFound(_) | SearchError::Timeout { .. } => false,
        }
    }

    /// The node whose lookup failed, if any.
    pub fn node(&self) -> Option<Node> {
        match self {
            SearchError::NotFound(node) | SearchError::Provider { node, .. } => Some(*node),
            SearchError::Timeout { .. } => None,
        }
    }
}
