use std::collections::hash_map::Entry;
use std::collections::HashMap;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::cache::{AdjacencyCache, Neighbors};
use crate::error::SearchError;
use crate::node::Node;

/// All nodes discovered at one BFS depth, in discovery order.
pub type Frontier = Vec<Node>;

/// Node -> parent it was discovered from. Roots map to `None`.
pub type VisitedMap = HashMap<Node, Option<Node>>;

/// Outcome of expanding one frontier by one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub next: Frontier,
    /// First newly discovered node already visited by the other direction.
    pub meeting: Option<Node>,
}

/// Expand `frontier` by one level.
///
/// Neighbor lists are fetched concurrently (at most `concurrency` at a time)
/// but merged strictly in frontier order, so the result does not depend on
/// which fetch finishes first. Within one parent, neighbors come in ascending
/// id order. Every unvisited neighbor is recorded in `visited` with its parent
/// and appended to `next`. The full level is merged even after a meeting is
/// seen; the first meeting in merge order is reported.
///
/// Any failed fetch aborts the expansion: a level with an unresolved node
/// cannot guarantee shortest paths. `visited` is left untouched in that case.
pub async fn expand(
    cache: &AdjacencyCache,
    frontier: &[Node],
    visited: &mut VisitedMap,
    other: &VisitedMap,
    concurrency: usize,
) -> Result<Expansion, SearchError> {
    let resolved: Vec<(Node, Neighbors)> = stream::iter(frontier.iter().copied())
        .map(|node| async move {
            cache
                .neighbors(node)
                .await
                .map(|neighbors| (node, neighbors))
                .map_err(|source| SearchError::Provider { node, source })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut next = Vec::new();
    let mut meeting = None;

    for (parent, neighbors) in resolved {
        for &neighbor in neighbors.iter() {
            if let Entry::Vacant(slot) = visited.entry(neighbor) {
                slot.insert(Some(parent));
                next.push(neighbor);
                if meeting.is_none() && other.contains_key(&neighbor) {
                    meeting = Some(neighbor);
                }
            }
        }
    }

    Ok(Expansion { next, meeting })
}
