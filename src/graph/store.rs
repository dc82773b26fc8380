use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::{Graph, GraphData, GraphError, Link, Node, NodeId};

/// What a successful mutation did to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// Node or link set changed; the layout must reseed.
    Structural,
    /// Only a label changed; positions and energy stay as they are.
    Relabel,
    /// Nothing changed (e.g. a duplicate link).
    Unchanged,
}

impl Change {
    pub fn is_structural(self) -> bool {
        self == Self::Structural
    }
}

/// Owner of the current [`Graph`] and of node id allocation.
#[derive(Debug)]
pub struct GraphStore {
    graph: Arc<Graph>,
    /// `None` once `u64::MAX` has been handed out.
    next_id: Option<u64>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            graph: Arc::new(Graph::default()),
            next_id: Some(1),
        }
    }

    /// Builds a store from an interchange document.
    ///
    /// Duplicate links are dropped; every other inconsistency is an error.
    pub fn from_data(data: &GraphData) -> Result<Self, GraphError> {
        let mut nodes = Vec::with_capacity(data.nodes.len());
        let mut seen = HashSet::with_capacity(data.nodes.len());
        let mut max_numeric = 0u64;

        for raw in &data.nodes {
            if raw.id.as_str().trim().is_empty() {
                return Err(GraphError::InvalidInput("node id must not be blank".to_owned()));
            }
            if !seen.insert(raw.id.clone()) {
                return Err(GraphError::DuplicateId(raw.id.clone()));
            }
            max_numeric = max_numeric.max(raw.id.numeric().unwrap_or(0));
            nodes.push(Node {
                id: raw.id.clone(),
                label: validate_label(&raw.label)?,
            });
        }

        let mut links = Vec::with_capacity(data.links.len());
        let mut seen_links = HashSet::with_capacity(data.links.len());
        for raw in &data.links {
            for endpoint in [&raw.source, &raw.target] {
                if !seen.contains(endpoint) {
                    return Err(GraphError::NotFound(endpoint.clone()));
                }
            }
            let link = Link::new(raw.source.clone(), raw.target.clone());
            if seen_links.insert(link.clone()) {
                links.push(link);
            }
        }

        debug!(nodes = nodes.len(), links = links.len(), "graph store seeded");

        Ok(Self {
            graph: Arc::new(Graph::build(1, nodes, links)),
            next_id: max_numeric.checked_add(1),
        })
    }

    /// Current snapshot.
    pub fn graph(&self) -> Arc<Graph> {
        Arc::clone(&self.graph)
    }

    pub fn add_node(&mut self, label: &str) -> Result<NodeId, GraphError> {
        let label = validate_label(label)?;
        let id = self.fresh_id()?;

        let mut nodes = self.graph.nodes.clone();
        nodes.push(Node {
            id: id.clone(),
            label,
        });
        let links = self.graph.links.clone();
        self.commit(nodes, links);

        debug!(%id, "node added");
        Ok(id)
    }

    pub fn rename_node(&mut self, id: &NodeId, label: &str) -> Result<Change, GraphError> {
        let label = validate_label(label)?;
        let index = self
            .graph
            .index_of(id.as_str())
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;

        if self.graph.nodes[index].label == label {
            return Ok(Change::Unchanged);
        }

        let mut nodes = self.graph.nodes.clone();
        nodes[index].label = label;
        let links = self.graph.links.clone();
        self.commit(nodes, links);

        debug!(%id, "node renamed");
        Ok(Change::Relabel)
    }

    /// Removes the node and every link touching it in one snapshot swap.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<Change, GraphError> {
        if !self.graph.contains(id.as_str()) {
            return Err(GraphError::NotFound(id.clone()));
        }

        let nodes = self
            .graph
            .nodes
            .iter()
            .filter(|node| &node.id != id)
            .cloned()
            .collect::<Vec<_>>();
        let links = self
            .graph
            .links
            .iter()
            .filter(|link| !link.touches(id))
            .cloned()
            .collect::<Vec<_>>();
        let removed_links = self.graph.links.len() - links.len();
        self.commit(nodes, links);

        debug!(%id, removed_links, "node deleted");
        Ok(Change::Structural)
    }

    /// Adds `source -> target`. Adding an existing pair is a no-op.
    pub fn add_link(&mut self, source: &NodeId, target: &NodeId) -> Result<Change, GraphError> {
        for endpoint in [source, target] {
            if !self.graph.contains(endpoint.as_str()) {
                return Err(GraphError::NotFound(endpoint.clone()));
            }
        }

        if self.graph.has_link(source, target) {
            return Ok(Change::Unchanged);
        }

        let nodes = self.graph.nodes.clone();
        let mut links = self.graph.links.clone();
        links.push(Link::new(source.clone(), target.clone()));
        self.commit(nodes, links);

        debug!(%source, %target, "link added");
        Ok(Change::Structural)
    }

    pub fn delete_link(&mut self, source: &NodeId, target: &NodeId) -> Result<Change, GraphError> {
        if !self.graph.has_link(source, target) {
            return Err(GraphError::LinkNotFound {
                from: source.clone(),
                to: target.clone(),
            });
        }

        let nodes = self.graph.nodes.clone();
        let links = self
            .graph
            .links
            .iter()
            .filter(|link| !(&link.source == source && &link.target == target))
            .cloned()
            .collect::<Vec<_>>();
        self.commit(nodes, links);

        debug!(%source, %target, "link deleted");
        Ok(Change::Structural)
    }

    fn fresh_id(&mut self) -> Result<NodeId, GraphError> {
        while let Some(next) = self.next_id {
            self.next_id = next.checked_add(1);
            let candidate = NodeId::from(next.to_string());
            if !self.graph.contains(candidate.as_str()) {
                return Ok(candidate);
            }
        }
        Err(GraphError::InvalidInput("node id space exhausted".to_owned()))
    }

    fn commit(&mut self, nodes: Vec<Node>, links: Vec<Link>) {
        let revision = self.graph.revision + 1;
        self.graph = Arc::new(Graph::build(revision, nodes, links));
    }
}

fn validate_label(label: &str) -> Result<String, GraphError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(GraphError::InvalidInput("label must not be blank".to_owned()));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LinkData, NodeData};

    fn id(value: &str) -> NodeId {
        NodeId::from(value)
    }

    fn store_with(labels: &[&str]) -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let ids = labels
            .iter()
            .map(|label| store.add_node(label).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn add_node_assigns_increasing_ids() {
        let (store, ids) = store_with(&["a", "b", "c"]);
        assert_eq!(ids, vec![id("1"), id("2"), id("3")]);
        assert_eq!(store.graph().node_count(), 3);
    }

    #[test]
    fn deleted_ids_are_never_reused() {
        let (mut store, ids) = store_with(&["a", "b"]);
        store.delete_node(&ids[1]).unwrap();
        let next = store.add_node("c").unwrap();
        assert_eq!(next, id("3"));
    }

    #[test]
    fn blank_labels_are_rejected_without_mutation() {
        let (mut store, ids) = store_with(&["a"]);
        let before = store.graph();

        assert!(matches!(store.add_node("   "), Err(GraphError::InvalidInput(_))));
        assert!(matches!(
            store.rename_node(&ids[0], ""),
            Err(GraphError::InvalidInput(_))
        ));
        assert!(Arc::ptr_eq(&before, &store.graph()));
    }

    #[test]
    fn rename_missing_node_is_not_found() {
        let mut store = GraphStore::new();
        assert_eq!(
            store.rename_node(&id("9"), "x"),
            Err(GraphError::NotFound(id("9")))
        );
    }

    #[test]
    fn rename_keeps_topology() {
        let (mut store, ids) = store_with(&["a", "b"]);
        store.add_link(&ids[0], &ids[1]).unwrap();
        let before = store.graph();

        assert_eq!(store.rename_node(&ids[0], " alpha "), Ok(Change::Relabel));
        let after = store.graph();
        assert!(before.same_topology(&after));
        assert_eq!(after.label("1"), Some("alpha"));
        assert_eq!(store.rename_node(&ids[0], "alpha"), Ok(Change::Unchanged));
    }

    #[test]
    fn delete_node_removes_touching_links() {
        let (mut store, ids) = store_with(&["1", "2", "3"]);
        store.add_link(&ids[0], &ids[1]).unwrap();
        store.add_link(&ids[0], &ids[2]).unwrap();
        store.add_link(&ids[1], &ids[2]).unwrap();

        store.delete_node(&ids[0]).unwrap();
        let graph = store.graph();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.links(), &[Link::new(ids[1].clone(), ids[2].clone())]);
    }

    #[test]
    fn duplicate_link_is_ignored() {
        let (mut store, ids) = store_with(&["a", "b"]);
        assert_eq!(store.add_link(&ids[0], &ids[1]), Ok(Change::Structural));
        let revision = store.graph().revision();
        assert_eq!(store.add_link(&ids[0], &ids[1]), Ok(Change::Unchanged));
        assert_eq!(store.graph().revision(), revision);
        assert_eq!(store.graph().link_count(), 1);

        // The reverse direction is a different link.
        assert_eq!(store.add_link(&ids[1], &ids[0]), Ok(Change::Structural));
        assert_eq!(store.graph().link_count(), 2);
    }

    #[test]
    fn add_link_with_missing_endpoint_fails() {
        let (mut store, ids) = store_with(&["a"]);
        assert_eq!(
            store.add_link(&ids[0], &id("42")),
            Err(GraphError::NotFound(id("42")))
        );
        assert_eq!(store.graph().link_count(), 0);
    }

    #[test]
    fn delete_link_requires_existing_pair() {
        let (mut store, ids) = store_with(&["a", "b"]);
        store.add_link(&ids[0], &ids[1]).unwrap();
        assert_eq!(
            store.delete_link(&ids[1], &ids[0]),
            Err(GraphError::LinkNotFound {
                from: ids[1].clone(),
                to: ids[0].clone(),
            })
        );
        assert_eq!(store.delete_link(&ids[0], &ids[1]), Ok(Change::Structural));
        assert_eq!(store.graph().link_count(), 0);
    }

    #[test]
    fn mutations_publish_new_snapshots() {
        let (mut store, _) = store_with(&["a"]);
        let before = store.graph();
        store.add_node("b").unwrap();
        let after = store.graph();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.node_count(), 1);
        assert!(after.revision() > before.revision());
    }

    #[test]
    fn from_data_skips_taken_ids_when_allocating() {
        let data = GraphData {
            nodes: vec![
                NodeData::new("alpha", "Alpha"),
                NodeData::new("7", "Seven"),
            ],
            links: vec![
                LinkData::new("alpha", "7"),
                LinkData::new("alpha", "7"),
            ],
        };
        let mut store = GraphStore::from_data(&data).unwrap();
        assert_eq!(store.graph().link_count(), 1);
        assert_eq!(store.add_node("next").unwrap(), id("8"));
    }

    #[test]
    fn exhausted_id_counter_fails_instead_of_spinning() {
        let data = GraphData {
            nodes: vec![NodeData::new(u64::MAX.to_string(), "last")],
            links: Vec::new(),
        };
        let mut store = GraphStore::from_data(&data).unwrap();
        let before = store.graph();

        assert!(matches!(store.add_node("next"), Err(GraphError::InvalidInput(_))));
        assert!(matches!(store.add_node("again"), Err(GraphError::InvalidInput(_))));
        assert!(Arc::ptr_eq(&before, &store.graph()));
    }

    #[test]
    fn largest_id_is_still_allocated_once() {
        let data = GraphData {
            nodes: vec![NodeData::new((u64::MAX - 1).to_string(), "almost")],
            links: Vec::new(),
        };
        let mut store = GraphStore::from_data(&data).unwrap();

        assert_eq!(store.add_node("last").unwrap(), NodeId::from(u64::MAX.to_string()));
        assert!(matches!(store.add_node("over"), Err(GraphError::InvalidInput(_))));
        assert_eq!(store.graph().node_count(), 2);
    }

    #[test]
    fn from_data_rejects_dangling_links_and_duplicate_ids() {
        let dangling = GraphData {
            nodes: vec![NodeData::new("a", "A")],
            links: vec![LinkData::new("a", "b")],
        };
        assert_eq!(
            GraphStore::from_data(&dangling).unwrap_err(),
            GraphError::NotFound(id("b"))
        );

        let duplicate = GraphData {
            nodes: vec![NodeData::new("a", "A"), NodeData::new("a", "B")],
            links: Vec::new(),
        };
        assert_eq!(
            GraphStore::from_data(&duplicate).unwrap_err(),
            GraphError::DuplicateId(id("a"))
        );
    }
}
