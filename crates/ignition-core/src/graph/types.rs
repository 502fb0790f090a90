//! Types for the dependency graph.

use std::fmt;
use std::sync::Arc;

/// Unique identifier for a cell within a notebook.
///
/// Assigned by the notebook and stable across edits of the cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell_{}", self.0)
    }
}

/// Name of a binding produced or consumed by a cell.
///
/// Backed by a shared string so that cloning a name while building graphs,
/// inputs and messages never copies the text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeName(Arc<str>);

impl EdgeName {
    /// The implicit binding holding a cell's displayed value.
    pub const DEFAULT: &'static str = "default";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the implicit `default` binding.
    pub fn is_default(&self) -> bool {
        &*self.0 == Self::DEFAULT
    }
}

impl fmt::Display for EdgeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EdgeName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl std::borrow::Borrow<str> for EdgeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for EdgeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EdgeName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(EdgeName::from)
    }
}

/// An import or export declared by a cell.
///
/// `input` is the name on the consuming side and `output` the name on the
/// producing side, which lets a binding be renamed as it crosses an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Port {
    pub input: EdgeName,
    pub output: EdgeName,
}

impl Port {
    pub fn new(input: impl Into<EdgeName>, output: impl Into<EdgeName>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// A port that keeps the same name on both sides.
    pub fn named(name: impl Into<EdgeName>) -> Self {
        let name = name.into();
        Self {
            input: name.clone(),
            output: name,
        }
    }
}

/// Label on a graph arc from a producer to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    /// Name the consumer reads.
    pub input: EdgeName,
    /// Name the producer writes.
    pub output: EdgeName,
}

/// A cell's imports and exports before they are linked into a graph.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DisconnectedNode {
    pub id: CellId,
    #[serde(default)]
    pub imports: Vec<Port>,
    #[serde(default)]
    pub exports: Vec<Port>,
}

impl DisconnectedNode {
    pub fn new(id: CellId) -> Self {
        Self {
            id,
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn with_import(mut self, port: Port) -> Self {
        self.imports.push(port);
        self
    }

    pub fn with_export(mut self, port: Port) -> Self {
        self.exports.push(port);
        self
    }
}

/// A node together with its resolved neighbours.
///
/// Neighbour lists are in the order the arcs were created.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraphNode {
    pub id: CellId,
    /// Producers feeding this node.
    pub inputs: Vec<(CellId, Edge)>,
    /// Consumers (and sibling producers) fed by this node.
    pub outputs: Vec<(CellId, Edge)>,
}

impl GraphNode {
    /// Distinct ids of the producers feeding this node.
    pub fn input_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        let mut seen = Vec::with_capacity(self.inputs.len());
        self.inputs.iter().filter_map(move |(id, _)| {
            if seen.contains(id) {
                None
            } else {
                seen.push(*id);
                Some(*id)
            }
        })
    }

    /// Whether `id` feeds this node directly.
    pub fn has_input(&self, id: CellId) -> bool {
        self.inputs.iter().any(|(from, _)| *from == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_display() {
        assert_eq!(CellId::new(7).to_string(), "cell_7");
    }

    #[test]
    fn test_edge_name_default() {
        assert!(EdgeName::new("default").is_default());
        assert!(!EdgeName::new("x").is_default());
    }

    #[test]
    fn test_edge_name_serializes_as_string() {
        let json = serde_json::to_string(&EdgeName::new("total")).unwrap();
        assert_eq!(json, "\"total\"");
        let parsed: EdgeName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_str(), "total");
    }

    #[test]
    fn test_input_ids_deduplicates() {
        let a = CellId::new(1);
        let edge = |n: &str| Edge {
            input: n.into(),
            output: n.into(),
        };
        let node = GraphNode {
            id: CellId::new(2),
            inputs: vec![(a, edge("x")), (a, edge("y"))],
            outputs: vec![],
        };
        assert_eq!(node.input_ids().collect::<Vec<_>>(), vec![a]);
        assert!(node.has_input(a));
    }
}
