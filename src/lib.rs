//! Core of an interactive force-directed graph editor.
//!
//! [`graph`] owns the topology, [`physics`] lays it out with a d3-style
//! velocity Verlet simulation, and [`interaction`] turns pointer gestures
//! into engine commands. [`workspace::Workspace`] ties the three together so
//! that every structural edit reseeds the layout before the next tick.

pub mod graph;
pub mod interaction;
pub mod physics;
pub mod util;
pub mod workspace;

pub use graph::{Graph, GraphData, GraphError, GraphStore, NodeId};
pub use interaction::{InteractionController, ViewTransform};
pub use physics::{EngineState, Simulation, SimulationConfig, Snapshot};
pub use workspace::Workspace;
