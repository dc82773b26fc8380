//! Force-directed layout: the force terms and the engine that integrates them.

mod config;
mod engine;
mod forces;
mod quadtree;

pub use config::SimulationConfig;
pub use engine::{
    Command, CommandSender, EngineState, LinkPosition, NodePosition, NodeState, Simulation,
    Snapshot,
};
pub use forces::{
    ForceField, ForceKind, LinkSpring, axis_force, center_force, charge_force,
    charge_force_approximate, link_force, resolve_springs,
};
