//! Graph command implementation.
//!
//! Prints the dependency graph as JSON.

use ignition_core::blueprint::Architect;
use serde::Serialize;

use crate::notebook_file;

#[derive(Debug, Serialize)]
struct GraphReport {
    /// Cells, upstream first
    order: Vec<String>,
    edges: Vec<EdgeReport>,
}

#[derive(Debug, Serialize)]
struct EdgeReport {
    from: String,
    to: String,
    input: String,
    output: String,
}

/// Print the notebook's dependency graph.
pub fn execute(notebook_path: &str) -> anyhow::Result<()> {
    let notebook = notebook_file::load(notebook_path)?;
    let blueprint = Architect::draft(&notebook);

    let report = GraphReport {
        order: blueprint.order().iter().map(ToString::to_string).collect(),
        edges: blueprint
            .graph()
            .edges()
            .map(|(from, to, edge)| EdgeReport {
                from: from.to_string(),
                to: to.to_string(),
                input: edge.input.to_string(),
                output: edge.output.to_string(),
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
