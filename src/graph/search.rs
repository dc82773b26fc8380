use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::{Graph, NodeId};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Nodes whose label or id fuzzily matches `query`, best match first.
///
/// Ties keep graph order. A blank query matches nothing.
pub fn search(graph: &Graph, query: &str, limit: usize) -> Vec<NodeId> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = graph
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let by_label = fuzzy_match_score(&matcher, &node.label, query);
            let by_id = fuzzy_match_score(&matcher, node.id.as_str(), query);
            by_label.max(by_id).map(|score| (score, index))
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, index)| graph.nodes()[index].id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    #[test]
    fn ranks_label_matches() {
        let mut store = GraphStore::new();
        store.add_node("Research").unwrap();
        store.add_node("Planning").unwrap();
        store.add_node("Release").unwrap();

        let hits = search(&store.graph(), "res", 10);
        assert!(hits.contains(&NodeId::from("1")));
        assert!(!hits.contains(&NodeId::from("2")));
    }

    #[test]
    fn blank_query_matches_nothing() {
        let mut store = GraphStore::new();
        store.add_node("Research").unwrap();
        assert!(search(&store.graph(), "  ", 10).is_empty());
    }

    #[test]
    fn respects_limit() {
        let mut store = GraphStore::new();
        for label in ["node a", "node b", "node c"] {
            store.add_node(label).unwrap();
        }
        assert_eq!(search(&store.graph(), "node", 2).len(), 2);
    }
}
