//! Error types for ignition-core.

use thiserror::Error;

use crate::graph::{CellId, EdgeName};

/// Result type for ignition-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the notebook and engine APIs.
///
/// These describe misuse of the API. Problems inside a single cell are never
/// reported here; they become a [`CellError`] stored on that cell.
#[derive(Debug, Error)]
pub enum Error {
    /// Cell not found.
    #[error("cell not found: {0}")]
    CellNotFound(CellId),

    /// A cell with this id is already part of the notebook.
    #[error("duplicate cell: {0}")]
    DuplicateCell(CellId),

    /// No id would be left for cells added after this one.
    #[error("cell id out of range: {0}")]
    CellIdOverflow(CellId),

    /// `run_until_settled` gave up after the configured number of ticks.
    #[error("notebook did not settle within {0} ticks")]
    TickLimit(usize),
}

/// Per-cell failure.
///
/// The `Display` output is the exact message shown in place of the cell's
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CellError {
    /// The external compiler rejected the cell's source.
    #[error("{0}")]
    Compile(String),

    /// The cell returns from its top level instead of from a function.
    #[error("Top level return statements are not allowed")]
    TopLevelReturn,

    /// The cell defines names that another cell defines too.
    #[error("Multiple definitions of `{}`", join_names(.0))]
    MultipleDefinitions(Vec<EdgeName>),

    /// The cell is part of one or more dependency cycles.
    ///
    /// Each path starts and ends with the same name.
    #[error("Cyclical dependency {}", format_cycles(.0))]
    CyclicDependency(Vec<Vec<EdgeName>>),

    /// The runner threw while executing the cell.
    #[error("{0}")]
    Runtime(String),
}

fn join_names(names: &[EdgeName]) -> String {
    names
        .iter()
        .map(EdgeName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_cycles(paths: &[Vec<EdgeName>]) -> String {
    paths
        .iter()
        .map(|path| {
            let names: Vec<String> = path.iter().map(|name| format!("`{}`", name)).collect();
            format!("({})", names.join(" -> "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
