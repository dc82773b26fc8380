//! Property-based invariant tests for editing plus layout.
//!
//! For any sequence of edits applied through a workspace:
//!
//! 1. The snapshot never references a node that is not in the graph.
//! 2. Every coordinate stays finite while the layout runs to rest.
//! 3. Adding a link that already exists changes nothing.
//! 4. A pinned node stays exactly where it was pinned.

use eframe::egui::vec2;
use force_graph_editor::graph::{Change, NodeId};
use force_graph_editor::physics::{Command, EngineState, SimulationConfig};
use force_graph_editor::workspace::Workspace;
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Edit {
    AddNode,
    AddLink(usize, usize),
    DeleteNode(usize),
    DeleteLink(usize),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => Just(Edit::AddNode),
        4 => (0usize..32, 0usize..32).prop_map(|(a, b)| Edit::AddLink(a, b)),
        1 => (0usize..32).prop_map(Edit::DeleteNode),
        1 => (0usize..32).prop_map(Edit::DeleteLink),
    ]
}

fn pick(workspace: &Workspace, index: usize) -> Option<NodeId> {
    let graph = workspace.graph();
    let nodes = graph.nodes();
    (!nodes.is_empty()).then(|| nodes[index % nodes.len()].id.clone())
}

fn apply(workspace: &mut Workspace, edit: &Edit) {
    match *edit {
        Edit::AddNode => {
            let label = format!("n{}", workspace.graph().node_count());
            workspace.add_node(&label).unwrap();
        }
        Edit::AddLink(a, b) => {
            if let (Some(a), Some(b)) = (pick(workspace, a), pick(workspace, b)) {
                workspace.add_link(&a, &b).unwrap();
            }
        }
        Edit::DeleteNode(index) => {
            if let Some(id) = pick(workspace, index) {
                workspace.delete_node(&id).unwrap();
            }
        }
        Edit::DeleteLink(index) => {
            let graph = workspace.graph();
            if let Some(link) = graph.links().get(index % graph.link_count().max(1)) {
                workspace.delete_link(&link.source, &link.target).unwrap();
            }
        }
    }
}

fn assert_consistent(workspace: &Workspace) {
    let graph = workspace.graph();
    let snapshot = workspace.frame().snapshot;
    assert_eq!(snapshot.nodes.len(), graph.node_count());
    assert_eq!(snapshot.links.len(), graph.link_count());
    for node in &snapshot.nodes {
        assert!(graph.contains(node.id.as_str()), "stale node {}", node.id);
    }
    for link in &snapshot.links {
        assert!(graph.contains(link.source_id.as_str()));
        assert!(graph.contains(link.target_id.as_str()));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. No dangling references, finite coordinates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn edits_never_leave_dangling_references(edits in prop::collection::vec(arb_edit(), 1..40)) {
        let mut workspace = Workspace::new(SimulationConfig::default());
        for edit in &edits {
            apply(&mut workspace, edit);
            assert_consistent(&workspace);
            // Edits should land on a layout that is already moving.
            workspace.tick();
            assert_consistent(&workspace);
        }
    }

    #[test]
    fn layout_stays_finite_until_rest(edits in prop::collection::vec(arb_edit(), 1..40)) {
        let mut workspace = Workspace::new(SimulationConfig::default());
        for edit in &edits {
            apply(&mut workspace, edit);
        }

        workspace.simulation_mut().run_to_settle(2_000);
        prop_assert_eq!(workspace.simulation().state(), EngineState::Settled);
        for node in &workspace.frame().snapshot.nodes {
            prop_assert!(node.x.is_finite() && node.y.is_finite(), "node {} diverged", node.id);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Duplicate links are idempotent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn duplicate_link_is_a_no_op(count in 1usize..8, a in 0usize..8, b in 0usize..8) {
        let mut workspace = Workspace::new(SimulationConfig::default());
        for index in 0..count {
            workspace.add_node(&format!("n{index}")).unwrap();
        }
        let a = pick(&workspace, a).unwrap();
        let b = pick(&workspace, b).unwrap();

        prop_assert_eq!(workspace.add_link(&a, &b), Ok(Change::Structural));
        let revision = workspace.graph().revision();
        prop_assert_eq!(workspace.add_link(&a, &b), Ok(Change::Unchanged));
        prop_assert_eq!(workspace.graph().revision(), revision);
        prop_assert_eq!(workspace.graph().link_count(), 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Pinned nodes are immobile
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pinned_node_is_immobile(
        count in 2usize..10,
        x in -300.0f32..300.0,
        y in -300.0f32..300.0,
    ) {
        let mut workspace = Workspace::new(SimulationConfig::default());
        let mut ids = Vec::new();
        for index in 0..count {
            ids.push(workspace.add_node(&format!("n{index}")).unwrap());
        }
        for pair in ids.windows(2) {
            workspace.add_link(&pair[0], &pair[1]).unwrap();
        }

        let pinned = ids[0].clone();
        workspace.simulation().submit(Command::Pin { id: pinned.clone(), at: Some(vec2(x, y)) });
        for _ in 0..200 {
            workspace.tick();
            prop_assert_eq!(workspace.simulation().position(pinned.as_str()), Some(vec2(x, y)));
        }
    }
}
