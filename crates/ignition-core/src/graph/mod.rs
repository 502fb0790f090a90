//! Dependency graph for notebook cells.
//!
//! This module provides:
//! - Identity and binding types shared by the whole scheduler
//! - Graph construction from per-cell import/export summaries
//! - Topological ordering, cycle and conflict detection, reachability

mod analysis;
mod builder;
mod types;

pub use analysis::{cycles, downstream, multiple_definitions, topological_sort, upstream};
pub use builder::Graph;
pub use types::{CellId, DisconnectedNode, Edge, EdgeName, GraphNode, Port};
