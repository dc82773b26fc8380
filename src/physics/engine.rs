use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use eframe::egui::{Vec2, vec2};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::graph::{Graph, NodeId};
use crate::util::{phyllotaxis, stable_pair};

use super::SimulationConfig;
use super::forces::{ForceField, LinkSpring, resolve_springs};

/// Amplitude of the per-id jitter added to seeded positions.
const SEED_JITTER: f32 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Stopped; no ticks are produced until started.
    #[default]
    Idle,
    Running,
    /// Alpha reached its floor; the last snapshot stays current.
    Settled,
}

/// Kinematic state of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeState {
    pub id: NodeId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// While set, `position` is copied from here every tick and forces are ignored.
    pub pin: Option<Vec2>,
}

impl NodeState {
    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

/// Requests applied to the engine between ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Fix a node in place; `None` pins it where it currently is.
    Pin { id: NodeId, at: Option<Vec2> },
    MovePin { id: NodeId, to: Vec2 },
    Unpin(NodeId),
    UnpinAll,
    /// Raise alpha to at least the configured reheat level and resume ticking.
    Reheat,
    /// Level alpha decays toward; non-zero keeps the engine warm (e.g. mid-drag).
    SetAlphaTarget(f32),
    Configure(SimulationConfig),
    Start,
    Stop,
}

/// Cloneable handle that queues [`Command`]s for the engine.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    pub fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("simulation dropped; command discarded");
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub pinned: bool,
}

impl NodePosition {
    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkPosition {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub source: [f32; 2],
    pub target: [f32; 2],
}

/// Node and link coordinates after a tick, in graph order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub alpha: f32,
    pub state: EngineState,
    pub nodes: Vec<NodePosition>,
    pub links: Vec<LinkPosition>,
}

impl Snapshot {
    pub fn node(&self, id: &str) -> Option<&NodePosition> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }
}

#[derive(Debug, Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    deltas: Vec<Vec2>,
}

/// Fixed-step force-directed layout engine.
///
/// The engine owns all physical state. Topology comes in through [`sync`],
/// which must be called synchronously after every structural graph change;
/// everything else arrives as [`Command`]s drained at the start of each tick.
///
/// [`sync`]: Simulation::sync
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    state: EngineState,
    alpha: f32,
    alpha_target: f32,
    nodes: Vec<NodeState>,
    index_by_id: HashMap<NodeId, usize>,
    link_pairs: Vec<(usize, usize)>,
    springs: Vec<LinkSpring>,
    field: ForceField,
    scratch: PhysicsScratch,
    seed_counter: u64,
    ticks: u64,
    /// Set by the first `sync`; an unchanged topology after that is a no-op.
    synced: bool,
    snapshot: Snapshot,
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            config: config.sanitized(),
            state: EngineState::Idle,
            alpha: 1.0,
            alpha_target: 0.0,
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
            link_pairs: Vec::new(),
            springs: Vec::new(),
            field: ForceField::new(),
            scratch: PhysicsScratch::default(),
            seed_counter: 0,
            ticks: 0,
            synced: false,
            snapshot: Snapshot::default(),
            tx,
            rx,
        }
    }

    pub fn commands(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&NodeState> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.node(id).map(|node| node.position)
    }

    /// Latest snapshot. Persists unchanged once the engine settles or stops.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Reseeds kinematic state for `graph` if its topology differs from the
    /// one currently loaded. Returns whether a reseed happened.
    pub fn sync(&mut self, graph: &Graph) -> bool {
        self.sync_with_seeds(graph, &HashMap::new())
    }

    /// Like [`sync`](Self::sync), placing new nodes found in `seeds` at the
    /// given positions instead of near the center.
    pub fn sync_with_seeds(&mut self, graph: &Graph, seeds: &HashMap<NodeId, Vec2>) -> bool {
        // Queued commands were issued against the old topology.
        self.drain_commands();

        let link_pairs = graph
            .links()
            .iter()
            .filter_map(|link| {
                Some((
                    graph.index_of(link.source.as_str())?,
                    graph.index_of(link.target.as_str())?,
                ))
            })
            .collect::<Vec<_>>();

        let same_nodes = self.nodes.len() == graph.node_count()
            && self
                .nodes
                .iter()
                .zip(graph.nodes())
                .all(|(state, node)| state.id == node.id);
        if self.synced && same_nodes && link_pairs == self.link_pairs {
            return false;
        }

        let mut previous = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|state| (state.id.clone(), state))
            .collect::<HashMap<_, _>>();
        let kept_before = previous.len();

        let center = self.config.center();
        let mut seeded = 0usize;
        let mut nodes = Vec::with_capacity(graph.node_count());
        for node in graph.nodes() {
            let state = match previous.remove(&node.id) {
                Some(state) => state,
                None => {
                    seeded += 1;
                    let position = seeds
                        .get(&node.id)
                        .copied()
                        .unwrap_or_else(|| self.seed_position(center, &node.id));
                    NodeState {
                        id: node.id.clone(),
                        position,
                        velocity: Vec2::ZERO,
                        pin: None,
                    }
                }
            };
            nodes.push(state);
        }

        self.index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, state)| (state.id.clone(), index))
            .collect();
        self.nodes = nodes;
        self.springs = resolve_springs(&link_pairs, self.nodes.len(), self.config.link_strength);
        self.link_pairs = link_pairs;
        self.synced = true;
        self.alpha = 1.0;
        self.state = EngineState::Running;
        self.refresh_snapshot();

        debug!(
            nodes = self.nodes.len(),
            links = self.link_pairs.len(),
            seeded,
            removed = kept_before - (self.nodes.len() - seeded),
            "simulation reseeded"
        );
        true
    }

    fn seed_position(&mut self, center: Vec2, id: &NodeId) -> Vec2 {
        let offset = phyllotaxis(self.seed_counter);
        self.seed_counter += 1;
        let (jx, jy) = stable_pair(id.as_str());
        center + offset + vec2(jx, jy) * SEED_JITTER
    }

    /// Resumes ticking. A fully cooled engine is reheated to full energy.
    pub fn start(&mut self) {
        if self.alpha <= self.config.alpha_min {
            self.alpha = 1.0;
        }
        self.state = EngineState::Running;
        self.snapshot.state = self.state;
    }

    /// Halts ticking from any state; the current snapshot is kept.
    pub fn stop(&mut self) {
        self.state = EngineState::Idle;
        self.snapshot.state = self.state;
    }

    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        self.state = EngineState::Running;
        self.snapshot.state = self.state;
    }

    /// Queues a command for the next tick boundary.
    pub fn submit(&self, command: Command) {
        // Both channel ends live in `self`, so this cannot fail.
        let _ = self.tx.send(command);
    }

    /// Applies every queued command now. Returns how many were applied.
    pub fn drain_commands(&mut self) -> usize {
        let mut applied = 0usize;
        loop {
            match self.rx.try_recv() {
                Ok(command) => {
                    if self.apply(command) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if applied > 0 {
            trace!(applied, "commands drained");
        }
        applied
    }

    /// Applies one command immediately. Commands naming unknown nodes are
    /// dropped and reported as not applied.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Pin { id, at: Some(at) } | Command::MovePin { id, to: at }
                if !(at.x.is_finite() && at.y.is_finite()) =>
            {
                warn!(%id, ?at, "pin at non-finite position dropped");
                false
            }
            Command::Pin { id, at } => self.with_node(&id, |node| {
                let pin = at.unwrap_or(node.position);
                node.pin = Some(pin);
                node.position = pin;
                node.velocity = Vec2::ZERO;
            }),
            Command::MovePin { id, to } => self.with_node(&id, |node| {
                node.pin = Some(to);
                node.position = to;
                node.velocity = Vec2::ZERO;
            }),
            Command::Unpin(id) => self.with_node(&id, |node| node.pin = None),
            Command::UnpinAll => {
                for node in &mut self.nodes {
                    node.pin = None;
                }
                true
            }
            Command::Reheat => {
                self.reheat();
                true
            }
            Command::SetAlphaTarget(target) => {
                self.alpha_target = if target.is_finite() {
                    target.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                true
            }
            Command::Configure(config) => {
                self.config = config.sanitized();
                self.springs = resolve_springs(
                    &self.link_pairs,
                    self.nodes.len(),
                    self.config.link_strength,
                );
                self.reheat();
                true
            }
            Command::Start => {
                self.start();
                true
            }
            Command::Stop => {
                self.stop();
                true
            }
        }
    }

    fn with_node(&mut self, id: &NodeId, update: impl FnOnce(&mut NodeState)) -> bool {
        match self.index_by_id.get(id.as_str()) {
            Some(&index) => {
                update(&mut self.nodes[index]);
                true
            }
            None => {
                warn!(%id, "command for unknown node dropped");
                false
            }
        }
    }

    /// Runs one integration step if the engine is running.
    ///
    /// Returns the new snapshot, or `None` when no step ran (idle or settled).
    pub fn tick(&mut self) -> Option<&Snapshot> {
        self.drain_commands();
        if self.state != EngineState::Running {
            return None;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.velocities.push(node.velocity);
        }

        self.field.evaluate(
            &self.config,
            &scratch.positions,
            &scratch.velocities,
            &self.springs,
            self.alpha,
            &mut scratch.deltas,
        );

        let decay = self.config.velocity_decay;
        for (node, delta) in self.nodes.iter_mut().zip(&scratch.deltas) {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = (node.velocity + *delta) * decay;
            if !velocity.x.is_finite() || !velocity.y.is_finite() {
                node.velocity = Vec2::ZERO;
                continue;
            }
            node.velocity = velocity;
            node.position += velocity;
        }

        self.ticks += 1;
        if self.alpha <= self.config.alpha_min {
            self.state = EngineState::Settled;
            debug!(ticks = self.ticks, "simulation settled");
        }
        trace!(tick = self.ticks, alpha = self.alpha, "tick");

        self.refresh_snapshot();
        Some(&self.snapshot)
    }

    /// Ticks until the engine stops running or `max_ticks` steps have run.
    /// Returns the number of steps taken.
    pub fn run_to_settle(&mut self, max_ticks: usize) -> usize {
        let mut taken = 0;
        while taken < max_ticks && self.tick().is_some() {
            taken += 1;
        }
        taken
    }

    fn refresh_snapshot(&mut self) {
        let snapshot = &mut self.snapshot;
        snapshot.tick = self.ticks;
        snapshot.alpha = self.alpha;
        snapshot.state = self.state;

        snapshot.nodes.clear();
        snapshot.nodes.extend(self.nodes.iter().map(|node| NodePosition {
            id: node.id.clone(),
            x: node.position.x,
            y: node.position.y,
            pinned: node.is_pinned(),
        }));

        snapshot.links.clear();
        snapshot
            .links
            .extend(self.link_pairs.iter().map(|&(source, target)| {
                let source_node = &self.nodes[source];
                let target_node = &self.nodes[target];
                LinkPosition {
                    source_id: source_node.id.clone(),
                    target_id: target_node.id.clone(),
                    source: [source_node.position.x, source_node.position.y],
                    target: [target_node.position.x, target_node.position.y],
                }
            }));
    }
}
