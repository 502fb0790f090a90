//! Per-cell execution records.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::context::AbortHandle;
use super::runner::Bindings;
use crate::error::CellError;
use crate::graph::CellId;
use crate::time::EngineTime;

/// What a cell's latest run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Outcome<V> {
    /// Bindings the cell produced, `None` before the first run.
    Return(Option<Bindings<V>>),
    /// Error the cell threw, or the error of a broken cell.
    Throw(CellError),
}

impl<V> Default for Outcome<V> {
    fn default() -> Self {
        Outcome::Return(None)
    }
}

impl<V> Outcome<V> {
    pub fn is_throw(&self) -> bool {
        matches!(self, Outcome::Throw(_))
    }

    /// The returned bindings, if the cell returned any.
    pub fn bindings(&self) -> Option<&Bindings<V>> {
        match self {
            Outcome::Return(bindings) => bindings.as_ref(),
            Outcome::Throw(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CellError> {
        match self {
            Outcome::Throw(error) => Some(error),
            Outcome::Return(_) => None,
        }
    }
}

/// Mutable execution state of one cell, owned by the engine.
#[derive(Debug, Clone)]
pub struct Cylinder<V> {
    pub(crate) id: CellId,
    pub(crate) running: bool,
    pub(crate) waiting: bool,
    pub(crate) result: Outcome<V>,
    /// Request time of the run that last completed
    pub(crate) last_run: EngineTime,
    /// Engine tick at which the last run completed
    pub(crate) last_internal_run: EngineTime,
    /// Produced bindings, without `default`
    pub(crate) variables: Bindings<V>,
    /// Cells whose values the last run consulted
    pub(crate) upstream_cells: Vec<CellId>,
    pub(crate) abort: AbortHandle,
}

impl<V> Cylinder<V> {
    /// A cylinder for a cell that has never run.
    pub fn new(id: CellId) -> Self {
        Self {
            id,
            running: false,
            waiting: false,
            result: Outcome::default(),
            last_run: EngineTime::Earliest,
            last_internal_run: EngineTime::Earliest,
            variables: FxHashMap::default(),
            upstream_cells: Vec::new(),
            abort: AbortHandle::new(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn result(&self) -> &Outcome<V> {
        &self.result
    }

    pub fn last_run(&self) -> EngineTime {
        self.last_run
    }

    pub fn last_internal_run(&self) -> EngineTime {
        self.last_internal_run
    }

    pub fn variables(&self) -> &Bindings<V> {
        &self.variables
    }

    pub fn upstream_cells(&self) -> &[CellId] {
        &self.upstream_cells
    }

    /// Handle of the current (or most recent) run.
    pub fn abort_handle(&self) -> &AbortHandle {
        &self.abort
    }
}

/// All cylinders, keyed by cell.
#[derive(Debug, Clone)]
pub struct CylinderStore<V> {
    cylinders: FxHashMap<CellId, Cylinder<V>>,
}

impl<V> Default for CylinderStore<V> {
    fn default() -> Self {
        Self {
            cylinders: FxHashMap::default(),
        }
    }
}

impl<V> CylinderStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cylinder for `id` unless one exists. Returns whether it was created.
    pub fn ensure(&mut self, id: CellId) -> bool {
        if self.cylinders.contains_key(&id) {
            return false;
        }
        self.cylinders.insert(id, Cylinder::new(id));
        true
    }

    pub fn get(&self, id: CellId) -> Option<&Cylinder<V>> {
        self.cylinders.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: CellId) -> Option<&mut Cylinder<V>> {
        self.cylinders.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: CellId) -> Option<Cylinder<V>> {
        self.cylinders.remove(&id)
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cylinders.contains_key(&id)
    }

    /// Cell ids in ascending order.
    pub fn ids(&self) -> Vec<CellId> {
        let mut ids: Vec<_> = self.cylinders.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cylinder<V>> {
        self.cylinders.values()
    }

    pub fn len(&self) -> usize {
        self.cylinders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cylinders.is_empty()
    }
}
