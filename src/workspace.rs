use std::sync::Arc;

use tracing::info;

use crate::graph::{Change, Graph, GraphData, GraphError, GraphStore, NodeId};
use crate::interaction::{InteractionController, ViewTransform};
use crate::physics::{Command, Simulation, SimulationConfig, Snapshot};

/// What the renderer needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub snapshot: &'a Snapshot,
    pub view: ViewTransform,
}

/// One editable graph view: topology, layout engine and pointer handling.
///
/// Every structural mutation reseeds the engine before the call returns, so
/// no tick ever runs against a topology that still references a deleted node.
#[derive(Debug)]
pub struct Workspace {
    store: GraphStore,
    simulation: Simulation,
    controller: InteractionController,
}

impl Workspace {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_store(GraphStore::new(), config)
    }

    pub fn from_data(data: &GraphData, config: SimulationConfig) -> Result<Self, GraphError> {
        let store = GraphStore::from_data(data)?;
        let simulation = Simulation::new(config);
        let controller =
            InteractionController::new(simulation.commands(), simulation.config().reheat_alpha);
        let mut workspace = Self {
            store,
            simulation,
            controller,
        };

        let graph = workspace.store.graph();
        workspace
            .simulation
            .sync_with_seeds(&graph, &data.seed_positions());
        info!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            "workspace loaded"
        );
        Ok(workspace)
    }

    fn with_store(store: GraphStore, config: SimulationConfig) -> Self {
        let mut simulation = Simulation::new(config);
        simulation.sync(&store.graph());
        let controller =
            InteractionController::new(simulation.commands(), simulation.config().reheat_alpha);
        Self {
            store,
            simulation,
            controller,
        }
    }

    pub fn graph(&self) -> Arc<Graph> {
        self.store.graph()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    pub fn add_node(&mut self, label: &str) -> Result<NodeId, GraphError> {
        let id = self.store.add_node(label)?;
        self.after(Change::Structural);
        Ok(id)
    }

    pub fn rename_node(&mut self, id: &NodeId, label: &str) -> Result<Change, GraphError> {
        let change = self.store.rename_node(id, label)?;
        self.after(change);
        Ok(change)
    }

    pub fn delete_node(&mut self, id: &NodeId) -> Result<Change, GraphError> {
        let change = self.store.delete_node(id)?;
        self.after(change);
        Ok(change)
    }

    pub fn add_link(&mut self, source: &NodeId, target: &NodeId) -> Result<Change, GraphError> {
        let change = self.store.add_link(source, target)?;
        self.after(change);
        Ok(change)
    }

    pub fn delete_link(&mut self, source: &NodeId, target: &NodeId) -> Result<Change, GraphError> {
        let change = self.store.delete_link(source, target)?;
        self.after(change);
        Ok(change)
    }

    fn after(&mut self, change: Change) {
        if change.is_structural() {
            self.simulation.sync(&self.store.graph());
        }
    }

    /// Replaces the physics constants at the next tick boundary.
    pub fn configure(&mut self, config: SimulationConfig) {
        self.controller.set_reheat_alpha(config.reheat_alpha);
        self.simulation.submit(Command::Configure(config));
    }

    /// Advances the engine one step; `None` when it is idle or settled.
    pub fn tick(&mut self) -> Option<Frame<'_>> {
        let view = self.controller.view();
        self.simulation
            .tick()
            .map(|snapshot| Frame { snapshot, view })
    }

    /// The latest frame, whether or not the engine is running.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            snapshot: self.simulation.snapshot(),
            view: self.controller.view(),
        }
    }
}
