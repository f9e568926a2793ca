use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::cache::AdjacencyCache;
use crate::frontier::VisitedMap;
use crate::node::{Node, PathResult};
use crate::provider::{MetadataProvider, ProviderError};

/// A labelled node of a path, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub node: Node,
    /// Person name, or movie title with release year.
    pub label: String,
    /// Provider-relative profile or poster image path.
    pub image_path: Option<String>,
}

/// Join the two search trees at `meeting`.
///
/// Walks `visited_a` from the meeting node back to the source and reverses it,
/// then follows `visited_b` from the meeting node's B-parent to the target.
/// The meeting node must be present in both maps.
pub fn reconstruct(visited_a: &VisitedMap, visited_b: &VisitedMap, meeting: Node) -> PathResult {
    let mut nodes = Vec::new();
    let mut current = Some(meeting);
    while let Some(node) = current {
        nodes.push(node);
        current = visited_a.get(&node).copied().flatten();
    }
    nodes.reverse();

    let mut current = visited_b.get(&meeting).copied().flatten();
    while let Some(node) = current {
        nodes.push(node);
        current = visited_b.get(&node).copied().flatten();
    }

    PathResult::new(nodes)
}

/// Check that a path alternates kinds and that every step is an edge according
/// to the adjacency lists still resident in `cache`.
///
/// Pairs whose entry has been evicted are not checked. Returns the first
/// offending pair.
pub fn verify_edges(cache: &AdjacencyCache, path: &PathResult) -> Result<(), (Node, Node)> {
    for pair in path.nodes().windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if from.kind() == to.kind() {
            return Err((from, to));
        }
        if let Some(neighbors) = cache.peek(from) {
            if neighbors.binary_search(&to).is_err() {
                return Err((from, to));
            }
        }
    }
    Ok(())
}

/// Fetch display labels for every node of `path`, preserving order.
pub async fn describe_path(
    provider: &dyn MetadataProvider,
    path: &PathResult,
    concurrency: usize,
) -> Result<Vec<PathStep>, ProviderError> {
    stream::iter(path.nodes().iter().copied())
        .map(|node| async move {
            let step = match node {
                Node::Person(id) => {
                    let person = provider.person_detail(id).await?;
                    PathStep {
                        node,
                        label: non_empty_or_unknown(person.name),
                        image_path: person.profile_path,
                    }
                }
                Node::Movie(id) => {
                    let movie = provider.movie_detail(id).await?;
                    PathStep {
                        node,
                        label: non_empty_or_unknown(movie.display_title()),
                        image_path: movie.poster_path,
                    }
                }
            };
            Ok::<_, ProviderError>(step)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

fn non_empty_or_unknown(label: String) -> String {
    if label.trim().is_empty() {
        "Unknown".to_string()
    } else {
        label
    }
}
