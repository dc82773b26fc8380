use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::NodeId;

/// Interchange form of a graph, as produced by the graph generator backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub links: Vec<LinkData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
    pub label: String,
    /// Optional initial layout position; used only when both axes are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
}

impl NodeData {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            x: None,
            y: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkData {
    pub source: NodeId,
    pub target: NodeId,
}

impl LinkData {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl GraphData {
    /// Initial positions for nodes that carry finite coordinates on both axes.
    pub fn seed_positions(&self) -> HashMap<NodeId, Vec2> {
        self.nodes
            .iter()
            .filter_map(|node| match (node.x, node.y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                    Some((node.id.clone(), vec2(x, y)))
                }
                _ => None,
            })
            .collect()
    }
}

/// Small fallback graph used when no document is supplied.
pub fn demo_graph() -> GraphData {
    GraphData {
        nodes: vec![
            NodeData::new("1", "Start"),
            NodeData::new("2", "Research"),
            NodeData::new("3", "Planning"),
            NodeData::new("4", "Implementation"),
            NodeData::new("5", "Testing"),
            NodeData::new("6", "Complete"),
        ],
        links: vec![
            LinkData::new("1", "2"),
            LinkData::new("1", "3"),
            LinkData::new("2", "4"),
            LinkData::new("3", "4"),
            LinkData::new("4", "5"),
            LinkData::new("5", "6"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_with_optional_positions() {
        let raw = r#"{
            "nodes": [
                {"id": "1", "label": "One", "x": 10.0, "y": -4.5},
                {"id": "2", "label": "Two", "x": null, "y": null},
                {"id": "3", "label": "Three", "x": 3.0}
            ],
            "links": [{"source": "1", "target": "2"}]
        }"#;

        let data: GraphData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.links.len(), 1);

        let seeds = data.seed_positions();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds.get("1"), Some(&vec2(10.0, -4.5)));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let data: GraphData = serde_json::from_str("{}").unwrap();
        assert!(data.nodes.is_empty());
        assert!(data.links.is_empty());
    }
}
