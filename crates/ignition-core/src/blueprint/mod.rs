//! Blueprints: the per-tick plan of which cells may run.
//!
//! The [`Architect`] classifies every code cell as either a [`Chamber`]
//! (runnable) or a [`Mistake`] (carries an error instead of running). Both
//! kinds keep their place in the dependency graph so that staleness still
//! flows through broken cells.

mod architect;

pub use architect::Architect;

use rustc_hash::FxHashMap;

use crate::error::CellError;
use crate::graph::{CellId, Graph, GraphNode};
use crate::time::EngineTime;

/// A cell that compiled cleanly and can be handed to the runner.
#[derive(Debug, Clone)]
pub struct Chamber<C> {
    pub id: CellId,
    /// Compiled form handed to the runner.
    pub code: C,
    pub node: GraphNode,
    pub requested_run_time: EngineTime,
    /// Label for the cell's value, when known.
    pub result_name: Option<String>,
}

/// A cell that cannot run. Firing it yields its error.
#[derive(Debug, Clone)]
pub struct Mistake {
    pub id: CellId,
    pub error: CellError,
    pub node: GraphNode,
    pub requested_run_time: EngineTime,
}

impl Mistake {
    /// Message shown in place of the cell's value.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Borrowed view of either kind of blueprint entry.
#[derive(Debug)]
pub enum Unit<'a, C> {
    Chamber(&'a Chamber<C>),
    Mistake(&'a Mistake),
}

impl<C> Clone for Unit<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Unit<'_, C> {}

impl<'a, C> Unit<'a, C> {
    pub fn id(&self) -> CellId {
        match self {
            Unit::Chamber(chamber) => chamber.id,
            Unit::Mistake(mistake) => mistake.id,
        }
    }

    pub fn node(&self) -> &'a GraphNode {
        match self {
            Unit::Chamber(chamber) => &chamber.node,
            Unit::Mistake(mistake) => &mistake.node,
        }
    }

    pub fn requested_run_time(&self) -> EngineTime {
        match self {
            Unit::Chamber(chamber) => chamber.requested_run_time,
            Unit::Mistake(mistake) => mistake.requested_run_time,
        }
    }

    pub fn is_mistake(&self) -> bool {
        matches!(self, Unit::Mistake(_))
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Chamber(usize),
    Mistake(usize),
}

/// Chambers and mistakes for one tick, in topological order.
#[derive(Debug, Clone)]
pub struct Blueprint<C> {
    chambers: Vec<Chamber<C>>,
    mistakes: Vec<Mistake>,
    slots: FxHashMap<CellId, Slot>,
    /// Chambers and mistakes interleaved, upstream first
    order: Vec<CellId>,
    graph: Graph,
}

impl<C> Blueprint<C> {
    pub(crate) fn new(graph: Graph, order: Vec<CellId>) -> Self {
        Self {
            chambers: Vec::new(),
            mistakes: Vec::new(),
            slots: FxHashMap::default(),
            order,
            graph,
        }
    }

    pub(crate) fn push_chamber(&mut self, chamber: Chamber<C>) {
        self.slots
            .insert(chamber.id, Slot::Chamber(self.chambers.len()));
        self.chambers.push(chamber);
    }

    pub(crate) fn push_mistake(&mut self, mistake: Mistake) {
        self.slots
            .insert(mistake.id, Slot::Mistake(self.mistakes.len()));
        self.mistakes.push(mistake);
    }

    /// Runnable cells, upstream first.
    pub fn chambers(&self) -> &[Chamber<C>] {
        &self.chambers
    }

    /// Broken cells, upstream first.
    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    pub fn chamber(&self, id: CellId) -> Option<&Chamber<C>> {
        match self.slots.get(&id)? {
            Slot::Chamber(pos) => self.chambers.get(*pos),
            Slot::Mistake(_) => None,
        }
    }

    pub fn mistake(&self, id: CellId) -> Option<&Mistake> {
        match self.slots.get(&id)? {
            Slot::Mistake(pos) => self.mistakes.get(*pos),
            Slot::Chamber(_) => None,
        }
    }

    pub fn unit(&self, id: CellId) -> Option<Unit<'_, C>> {
        match self.slots.get(&id)? {
            Slot::Chamber(pos) => self.chambers.get(*pos).map(Unit::Chamber),
            Slot::Mistake(pos) => self.mistakes.get(*pos).map(Unit::Mistake),
        }
    }

    /// Every entry, chambers and mistakes interleaved, upstream first.
    pub fn units(&self) -> impl Iterator<Item = Unit<'_, C>> + '_ {
        self.order.iter().filter_map(|id| self.unit(*id))
    }

    /// Ids of every entry, upstream first.
    pub fn order(&self) -> &[CellId] {
        &self.order
    }

    /// Whether the cell is scheduled (as either kind).
    pub fn contains(&self, id: CellId) -> bool {
        self.slots.contains_key(&id)
    }

    /// The graph the blueprint was drafted from.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
