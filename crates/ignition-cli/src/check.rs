//! Check command implementation.
//!
//! Drafts the blueprint and reports which cells can run.

use ignition_core::blueprint::{Architect, Unit};
use ignition_core::graph::CellId;
use ignition_core::notebook::Notebook;

use crate::colors;
use crate::notebook_file::{self, LiteralCode};

/// Check a notebook without running it.
pub fn execute(notebook_path: &str) -> anyhow::Result<()> {
    let notebook = notebook_file::load(notebook_path)?;
    crate::print_header("Checking", notebook_path);

    let blueprint = Architect::draft(&notebook);
    if blueprint.is_empty() {
        println!(
            "\n{}No code cells found in notebook.{}",
            colors::YELLOW,
            colors::RESET
        );
        return Ok(());
    }

    for unit in blueprint.units() {
        match unit {
            Unit::Chamber(chamber) => println!(
                "  {}✓{} {} {}{}{}",
                colors::GREEN,
                colors::RESET,
                chamber.id,
                colors::DIM,
                describe(&notebook, chamber.id),
                colors::RESET
            ),
            Unit::Mistake(mistake) => println!(
                "  {}✗{} {} {}",
                colors::RED,
                colors::RESET,
                mistake.id,
                mistake.message()
            ),
        }
    }

    println!("{}", "─".repeat(50));
    let broken = blueprint.mistakes().len();
    if broken > 0 {
        anyhow::bail!("{} of {} cells cannot run", broken, blueprint.len());
    }

    println!(
        "{}All {} cells can run{}",
        colors::GREEN,
        blueprint.len(),
        colors::RESET
    );
    Ok(())
}

/// One-line summary of a cell's imports and exports.
fn describe(notebook: &Notebook<LiteralCode>, id: CellId) -> String {
    let Some(Ok(compiled)) = notebook.cell(id).and_then(|cell| cell.compilation()) else {
        return String::new();
    };

    let names = |ports: &[ignition_core::graph::Port]| {
        ports
            .iter()
            .map(|port| port.output.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    match (compiled.imports.is_empty(), compiled.exports.is_empty()) {
        (true, true) => String::new(),
        (true, false) => format!("exports {}", names(&compiled.exports)),
        (false, true) => format!("imports {}", names(&compiled.imports)),
        (false, false) => format!(
            "imports {}; exports {}",
            names(&compiled.imports),
            names(&compiled.exports)
        ),
    }
}
