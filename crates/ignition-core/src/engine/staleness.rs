//! Deciding which cells must run.
//!
//! Every blueprint entry gets a propagated timestamp: `Latest` when the cell
//! itself was asked to run, otherwise the newest of its own last run, its
//! current inputs and the inputs its previous run used. A cell is stale when
//! that timestamp is newer than its own last run.
//!
//! The previous inputs matter because the graph can no longer see an edge to
//! a cell that was deleted or whose cycle was broken; such inputs force a
//! rerun.

use std::iter;

use rustc_hash::{FxHashMap, FxHashSet};

use super::cylinder::CylinderStore;
use crate::blueprint::{Blueprint, Unit};
use crate::graph::CellId;
use crate::time::{EngineTime, latest};

/// Result of a staleness pass.
#[derive(Debug, Clone, Default)]
pub struct Staleness {
    /// Stale cells, in the order they were found
    stale: Vec<CellId>,
    stale_set: FxHashSet<CellId>,
    propagated: FxHashMap<CellId, EngineTime>,
}

impl Staleness {
    /// Stale cells: blueprint order, then mistakes caught by the second pass.
    pub fn stale(&self) -> &[CellId] {
        &self.stale
    }

    pub fn is_stale(&self, id: CellId) -> bool {
        self.stale_set.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.stale.is_empty()
    }

    /// Timestamp propagated out of `id`, if it was evaluated.
    pub fn propagated(&self, id: CellId) -> Option<EngineTime> {
        self.propagated.get(&id).copied()
    }
}

/// Evaluate every blueprint entry against the cylinders.
///
/// Mistakes are visited a second time after the main pass so that a broken
/// cell ordered ahead of one of its inputs (possible inside cycles) still sees
/// that input's timestamp within the same tick.
pub fn evaluate<C, V>(blueprint: &Blueprint<C>, cylinders: &CylinderStore<V>) -> Staleness {
    let mut staleness = Staleness::default();

    for unit in blueprint.units() {
        visit(unit, cylinders, &mut staleness);
    }
    for mistake in blueprint.mistakes() {
        visit(Unit::<C>::Mistake(mistake), cylinders, &mut staleness);
    }

    staleness
}

fn visit<C, V>(unit: Unit<'_, C>, cylinders: &CylinderStore<V>, staleness: &mut Staleness) {
    let id = unit.id();
    let (last_run, last_internal_run, previous) = match cylinders.get(id) {
        Some(cylinder) => (
            cylinder.last_run(),
            cylinder.last_internal_run(),
            cylinder.upstream_cells(),
        ),
        None => (EngineTime::Earliest, EngineTime::Earliest, &[][..]),
    };

    let time = if unit.requested_run_time() > last_run {
        EngineTime::Latest
    } else {
        let computed = &staleness.propagated;
        let node = unit.node();

        let current = node
            .input_ids()
            .map(|input| computed.get(&input).copied().unwrap_or(EngineTime::Earliest));

        let used = previous.iter().map(|&input| {
            if !cylinders.contains(input) {
                // deleted since the last run
                EngineTime::Latest
            } else if let Some(&time) = computed.get(&input) {
                time
            } else if !node.has_input(input) {
                // no longer linked, e.g. a broken cycle
                EngineTime::Latest
            } else {
                EngineTime::Earliest
            }
        });

        latest(iter::once(last_internal_run).chain(current).chain(used))
    };

    staleness.propagated.insert(id, time);
    if time > last_internal_run && staleness.stale_set.insert(id) {
        tracing::debug!("Cell {} is stale (propagated {})", id, time);
        staleness.stale.push(id);
    }
}
