//! Dependency graph construction.
//!
//! Links the per-cell import/export summaries into a directed graph. Each arc
//! is stored once, so it is visible both as an output of its producer and as
//! an input of its consumer; the two views cannot drift apart.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use super::types::{CellId, DisconnectedNode, Edge, GraphNode};

/// Producer/consumer graph over the notebook's code cells.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Arcs go from producer to consumer
    graph: DiGraph<CellId, Edge>,
    /// Cell ID to node index mapping
    node_indices: FxHashMap<CellId, NodeIndex>,
}

impl Graph {
    /// Build the graph from disconnected nodes.
    ///
    /// A producer of `x` is linked to every node importing `x`, and to every
    /// other node that also exports `x` (except for the `default` binding).
    /// The sibling links make conflicting producers neighbours, which is what
    /// [`multiple_definitions`](super::multiple_definitions) looks for.
    pub fn build(nodes: &[DisconnectedNode]) -> Self {
        let mut graph = Self::default();

        for node in nodes {
            if graph.node_indices.contains_key(&node.id) {
                tracing::warn!("Ignoring duplicate graph node {}", node.id);
                continue;
            }
            let idx = graph.graph.add_node(node.id);
            graph.node_indices.insert(node.id, idx);
        }

        for producer in nodes {
            for export in &producer.exports {
                for consumer in nodes {
                    for import in &consumer.imports {
                        if import.input == export.output {
                            graph.connect(
                                producer.id,
                                consumer.id,
                                Edge {
                                    input: import.input.clone(),
                                    output: export.output.clone(),
                                },
                            );
                        }
                    }
                }

                if export.output.is_default() {
                    continue;
                }

                for sibling in nodes {
                    if sibling.id == producer.id {
                        continue;
                    }
                    if sibling.exports.iter().any(|e| e.output == export.output) {
                        graph.connect(
                            producer.id,
                            sibling.id,
                            Edge {
                                input: export.input.clone(),
                                output: export.output.clone(),
                            },
                        );
                    }
                }
            }
        }

        graph
    }

    fn connect(&mut self, from: CellId, to: CellId, edge: Edge) {
        let from_idx = self.node_indices[&from];
        let to_idx = self.node_indices[&to];
        self.graph.add_edge(from_idx, to_idx, edge);
    }

    /// Whether the cell is part of the graph.
    pub fn contains(&self, id: CellId) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// All cells, in the order they were given to [`Graph::build`].
    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx])
    }

    /// Get the number of cells.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Get the number of arcs.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Producers feeding `id`, in creation order.
    pub fn inputs(&self, id: CellId) -> Vec<(CellId, &Edge)> {
        self.neighbours(id, Direction::Incoming)
    }

    /// Consumers fed by `id`, in creation order.
    pub fn outputs(&self, id: CellId) -> Vec<(CellId, &Edge)> {
        self.neighbours(id, Direction::Outgoing)
    }

    fn neighbours(&self, id: CellId, direction: Direction) -> Vec<(CellId, &Edge)> {
        let Some(&idx) = self.node_indices.get(&id) else {
            return Vec::new();
        };

        // petgraph walks adjacency lists newest-first
        let mut arcs: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        arcs.sort_by_key(|arc| arc.id());

        arcs.into_iter()
            .map(|arc| {
                let other = match direction {
                    Direction::Incoming => arc.source(),
                    Direction::Outgoing => arc.target(),
                };
                (self.graph[other], arc.weight())
            })
            .collect()
    }

    /// Owned view of a node and its neighbours.
    pub fn node(&self, id: CellId) -> Option<GraphNode> {
        if !self.contains(id) {
            return None;
        }
        let own = |list: Vec<(CellId, &Edge)>| -> Vec<(CellId, Edge)> {
            list.into_iter()
                .map(|(other, edge)| (other, edge.clone()))
                .collect()
        };
        Some(GraphNode {
            id,
            inputs: own(self.inputs(id)),
            outputs: own(self.outputs(id)),
        })
    }

    /// All arcs as `(producer, consumer, edge)`, in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (CellId, CellId, &Edge)> + '_ {
        self.graph
            .edge_references()
            .map(|arc| (self.graph[arc.source()], self.graph[arc.target()], arc.weight()))
    }
}
