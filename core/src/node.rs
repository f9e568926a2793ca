use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-assigned identifier (TMDb person or movie id).
pub type EntityId = u64;

/// Which side of the bipartite graph a node lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Person,
    Movie,
}

impl NodeKind {
    /// The kind every neighbor of a node of this kind has.
    pub fn opposite(self) -> NodeKind {
        match self {
            NodeKind::Person => NodeKind::Movie,
            NodeKind::Movie => NodeKind::Person,
        }
    }

    pub fn node(self, id: EntityId) -> Node {
        match self {
            NodeKind::Person => Node::Person(id),
            NodeKind::Movie => Node::Movie(id),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Person => "person",
            NodeKind::Movie => "movie",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex of the person/movie graph.
///
/// Ordering is by (kind, id): every `Person` sorts before every `Movie`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Node {
    Person(EntityId),
    Movie(EntityId),
}

impl Node {
    pub fn kind(self) -> NodeKind {
        match self {
            Node::Person(_) => NodeKind::Person,
            Node::Movie(_) => NodeKind::Movie,
        }
    }

    pub fn id(self) -> EntityId {
        match self {
            Node::Person(id) | Node::Movie(id) => id,
        }
    }

    pub fn is_person(self) -> bool {
        matches!(self, Node::Person(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A shortest connection between two people, endpoints included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathResult {
    nodes: Vec<Node>,
}

impl PathResult {
    pub(crate) fn new(nodes: Vec<Node>) -> Self {
        debug_assert!(!nodes.is_empty(), "a path always contains its source");
        Self { nodes }
    }

    /// Path of a node to itself.
    pub fn single(node: Node) -> Self {
        Self { nodes: vec![node] }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges (one less than the number of nodes).
    pub fn edge_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Number of movies between the two endpoints.
    pub fn movie_hops(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_person()).count()
    }

    pub fn source(&self) -> Node {
        self.nodes[0]
    }

    pub fn target(&self) -> Node {
        self.nodes[self.nodes.len() - 1]
    }

    /// True when consecutive nodes never share a kind.
    pub fn is_alternating(&self) -> bool {
        self.nodes.windows(2).all(|w| w[0].kind() != w[1].kind())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

impl<'a> IntoIterator for &'a PathResult {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
