//! Interface to the external cell runner.

use std::future::Future;

use rustc_hash::FxHashMap;

use super::context::AbortHandle;
use crate::graph::{CellId, EdgeName};

/// Named values flowing between cells.
pub type Bindings<V> = FxHashMap<EdgeName, V>;

/// Everything the runner needs to execute one cell.
#[derive(Debug, Clone)]
pub struct RunRequest<C, V> {
    pub id: CellId,
    /// Compiled form of the cell.
    pub code: C,
    /// Values of the cell's imports that upstream cells have produced.
    /// Missing upstream values are left out rather than filled in.
    pub inputs: Bindings<V>,
    /// Aborted when the engine wants this run to stop.
    pub abort: AbortHandle,
}

/// Executes cell code on behalf of the engine.
///
/// The engine awaits one run at a time. A run returns every binding the cell
/// produced, including `default` when the cell has a displayed value, or the
/// message of whatever it threw.
pub trait CellRunner {
    /// Compiled cell representation produced by the external compiler.
    type Code: Clone + Send + Sync;
    /// Runtime value type.
    type Value: Clone + Send + Sync + 'static;

    fn run(
        &self,
        request: RunRequest<Self::Code, Self::Value>,
    ) -> impl Future<Output = Result<Bindings<Self::Value>, String>> + Send;
}
