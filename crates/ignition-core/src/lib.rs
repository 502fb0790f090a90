//! Core scheduler for the Ignition reactive notebook.
//!
//! This crate provides:
//! - Dependency graph over named imports and exports
//! - Blueprints that split cells into runnable chambers and broken mistakes
//! - Staleness propagation over a logical engine clock
//! - A tick-based engine that drives an external cell runner

pub mod blueprint;
pub mod engine;
pub mod error;
pub mod graph;
pub mod notebook;
pub mod time;

pub use blueprint::{Architect, Blueprint, Chamber, Mistake, Unit};
pub use engine::{
    AbortHandle, Bindings, CellRunner, CellStatus, CylinderEvent, CylinderSnapshot, Engine,
    EngineConfig, Outcome, RunRequest, Tick,
};
pub use error::{CellError, Error, Result};
pub use graph::{CellId, DisconnectedNode, Edge, EdgeName, Graph, GraphNode, Port};
pub use notebook::{CellContent, CellKind, Compilation, CompiledCell, Notebook, NotebookCell};
pub use time::{EngineClock, EngineTime};
