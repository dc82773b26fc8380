//! Authoritative topology: nodes, directed links and their mutations.
//!
//! The store never shares a [`Graph`] with its previous state. Every
//! successful mutation publishes a fresh `Arc<Graph>` with a higher
//! revision, so consumers can tell snapshots apart by identity.

mod data;
mod error;
mod search;
mod store;

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use data::{GraphData, LinkData, NodeData, demo_graph};
pub use error::GraphError;
pub use search::search;
pub use store::{Change, GraphStore};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, if it is a plain decimal number.
    pub(crate) fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
}

/// A directed edge. Identity is the ordered `(source, target)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
}

impl Link {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Immutable graph snapshot. Nodes keep insertion order.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    revision: u64,
    nodes: Vec<Node>,
    links: Vec<Link>,
    index_by_id: HashMap<NodeId, usize>,
}

impl Graph {
    pub(crate) fn build(revision: u64, nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        Self {
            revision,
            nodes,
            links,
            index_by_id,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.node(id).map(|node| node.label.as_str())
    }

    pub fn has_link(&self, source: &NodeId, target: &NodeId) -> bool {
        self.links
            .iter()
            .any(|link| &link.source == source && &link.target == target)
    }

    /// Node count and link set equal, ignoring labels.
    pub fn same_topology(&self, other: &Graph) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.links == other.links
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.id == b.id)
    }
}
