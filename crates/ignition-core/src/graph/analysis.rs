//! Read-only queries over a [`Graph`].

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use super::builder::Graph;
use super::types::{CellId, Edge, EdgeName};

/// Order cells so that every producer precedes its consumers.
///
/// Depth-first over inputs, emitting a cell once all of its inputs have been
/// emitted. Ties follow the order cells were given to the graph. Cycles do not
/// stop the walk; their members come out in discovery order.
pub fn topological_sort(graph: &Graph) -> Vec<CellId> {
    let mut visited = FxHashSet::default();
    let mut order = Vec::with_capacity(graph.len());

    for id in graph.ids() {
        visit_inputs(graph, id, &mut visited, &mut order);
    }

    order
}

fn visit_inputs(
    graph: &Graph,
    id: CellId,
    visited: &mut FxHashSet<CellId>,
    order: &mut Vec<CellId>,
) {
    if !visited.insert(id) {
        return;
    }
    for (from, _) in graph.inputs(id) {
        visit_inputs(graph, from, visited, order);
    }
    order.push(id);
}

/// Enumerate dependency cycles.
///
/// Each cycle lists its cells in arc order; the last cell feeds the first.
/// Every elementary cycle is reported exactly once: the walk from a cell only
/// enters cells that come later in graph order, so a cycle is found from its
/// earliest member only.
pub fn cycles(graph: &Graph) -> Vec<Vec<CellId>> {
    let rank: FxHashMap<CellId, usize> =
        graph.ids().enumerate().map(|(pos, id)| (id, pos)).collect();
    let mut found = Vec::new();
    let mut seen = FxHashSet::default();

    for start in graph.ids() {
        let mut path = vec![start];
        walk_cycles(graph, &rank, &mut path, &mut |cycle: Vec<CellId>| {
            if seen.insert(canonical(&cycle)) {
                found.push(cycle);
            }
        });
    }

    found
}

/// Extend the simple path `path` (which starts at the cycle's anchor) along
/// every out arc, recording each arc that closes back onto the anchor.
fn walk_cycles(
    graph: &Graph,
    rank: &FxHashMap<CellId, usize>,
    path: &mut Vec<CellId>,
    record: &mut dyn FnMut(Vec<CellId>),
) {
    let (Some(&start), Some(&current)) = (path.first(), path.last()) else {
        return;
    };
    let floor = rank.get(&start).copied().unwrap_or(0);

    let mut next: Vec<CellId> = Vec::new();
    for (to, _) in graph.outputs(current) {
        if !next.contains(&to) {
            next.push(to);
        }
    }

    for to in next {
        if to == start {
            record(path.clone());
        } else if rank.get(&to).is_some_and(|&pos| pos > floor) && !path.contains(&to) {
            path.push(to);
            walk_cycles(graph, rank, path, record);
            path.pop();
        }
    }
}

/// Rotate a cycle so it starts at its smallest id.
fn canonical(cycle: &[CellId]) -> Vec<CellId> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(pos, _)| pos)
        .unwrap_or(0);
    cycle[start..].iter().chain(&cycle[..start]).copied().collect()
}

/// Find names that a cell defines while another cell defines them too.
///
/// A cell conflicts on `x` when another cell feeds it `x` and it also
/// produces `x` itself. Sibling producers are linked both ways by the
/// builder, so every producer of a shared name is reported.
pub fn multiple_definitions(graph: &Graph) -> FxHashMap<CellId, BTreeSet<EdgeName>> {
    let mut conflicts: FxHashMap<CellId, BTreeSet<EdgeName>> = FxHashMap::default();

    for id in graph.ids() {
        let produced: FxHashSet<&EdgeName> =
            graph.outputs(id).into_iter().map(|(_, edge)| &edge.output).collect();

        for (from, edge) in graph.inputs(id) {
            if from != id && produced.contains(&edge.output) {
                conflicts.entry(id).or_default().insert(edge.output.clone());
            }
        }
    }

    conflicts
}

/// Every cell `id` transitively reads from, nearest first.
pub fn upstream(graph: &Graph, id: CellId) -> Vec<CellId> {
    reachable(graph, id, |graph, id| graph.inputs(id))
}

/// Every cell that transitively reads from `id`, nearest first.
pub fn downstream(graph: &Graph, id: CellId) -> Vec<CellId> {
    reachable(graph, id, |graph, id| graph.outputs(id))
}

fn reachable<'g, F>(graph: &'g Graph, start: CellId, neighbours: F) -> Vec<CellId>
where
    F: Fn(&'g Graph, CellId) -> Vec<(CellId, &'g Edge)>,
{
    let mut reached = Vec::new();
    let mut visited = FxHashSet::from_iter([start]);
    let mut queue = VecDeque::from([start]);

    // BFS over the chosen direction
    while let Some(current) = queue.pop_front() {
        for (next, _) in neighbours(graph, current) {
            if visited.insert(next) {
                reached.push(next);
                queue.push_back(next);
            }
        }
    }

    reached
}
