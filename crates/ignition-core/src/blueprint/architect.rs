//! Classification of notebook cells into chambers and mistakes.

use rustc_hash::FxHashMap;

use super::{Blueprint, Chamber, Mistake};
use crate::error::CellError;
use crate::graph::{self, CellId, EdgeName, Graph};
use crate::notebook::Notebook;

/// Drafts a [`Blueprint`] from the current notebook.
///
/// Checks run in priority order and the first failing one decides the
/// cell's error:
/// 1. compile error
/// 2. top-level `return`
/// 3. a name defined by another cell too
/// 4. membership in a dependency cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct Architect;

impl Architect {
    pub fn draft<C: Clone>(notebook: &Notebook<C>) -> Blueprint<C> {
        let nodes: Vec<_> = notebook.code_cells().map(|cell| cell.disconnected()).collect();
        let graph = Graph::build(&nodes);

        let conflicts = graph::multiple_definitions(&graph);
        let cycle_messages = cycle_paths(&graph);
        let order = graph::topological_sort(&graph);

        let mut blueprint = Blueprint::new(graph, order.clone());

        for id in order {
            let Some(cell) = notebook.cell(id) else {
                continue;
            };
            let Some(compilation) = cell.compilation() else {
                continue;
            };
            let Some(node) = blueprint.graph().node(id) else {
                continue;
            };

            let compiled = match compilation {
                Ok(compiled) => compiled,
                Err(message) => {
                    tracing::debug!("Cell {} failed to compile", id);
                    blueprint.push_mistake(Mistake {
                        id,
                        error: CellError::Compile(message.clone()),
                        node,
                        requested_run_time: cell.requested_run_time,
                    });
                    continue;
                }
            };

            let error = if compiled.has_top_level_return {
                Some(CellError::TopLevelReturn)
            } else if let Some(names) = conflicts.get(&id) {
                Some(CellError::MultipleDefinitions(names.iter().cloned().collect()))
            } else {
                cycle_messages
                    .get(&id)
                    .map(|paths| CellError::CyclicDependency(paths.clone()))
            };

            match error {
                Some(error) => {
                    tracing::debug!("Cell {} is broken: {}", id, error);
                    blueprint.push_mistake(Mistake {
                        id,
                        error,
                        node,
                        requested_run_time: cell.requested_run_time,
                    });
                }
                None => blueprint.push_chamber(Chamber {
                    id,
                    code: compiled.code.clone(),
                    node,
                    requested_run_time: cell.requested_run_time,
                    result_name: compiled.result_name.clone(),
                }),
            }
        }

        tracing::debug!(
            "Drafted blueprint: {} chambers, {} mistakes",
            blueprint.chambers().len(),
            blueprint.mistakes().len()
        );

        blueprint
    }
}

/// Name paths of every cycle, keyed by each member cell.
///
/// Each path is rotated to start at the keyed cell and repeats its first
/// name at the end, e.g. `x -> y -> x`.
fn cycle_paths(graph: &Graph) -> FxHashMap<CellId, Vec<Vec<EdgeName>>> {
    let mut paths: FxHashMap<CellId, Vec<Vec<EdgeName>>> = FxHashMap::default();

    for cycle in graph::cycles(graph) {
        for start in 0..cycle.len() {
            let rotated: Vec<CellId> = cycle[start..].iter().chain(&cycle[..start]).copied().collect();
            let mut names = Vec::with_capacity(rotated.len() + 1);
            for (pos, &from) in rotated.iter().enumerate() {
                let to = rotated[(pos + 1) % rotated.len()];
                if let Some(name) = arc_name(graph, from, to) {
                    names.push(name);
                }
            }
            if let Some(first) = names.first().cloned() {
                names.push(first);
            }
            paths.entry(rotated[0]).or_default().push(names);
        }
    }

    paths
}

fn arc_name(graph: &Graph, from: CellId, to: CellId) -> Option<EdgeName> {
    graph
        .outputs(from)
        .into_iter()
        .find(|(target, _)| *target == to)
        .map(|(_, edge)| edge.output.clone())
}
