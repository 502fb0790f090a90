//! Run command implementation.
//!
//! Drives a notebook to a fixed point with the literal runner and prints
//! every cell's result.

use std::collections::BTreeMap;
use std::time::Instant;

use ignition_core::engine::{CellStatus, Engine, EngineConfig, Outcome};
use serde::Serialize;
use serde_json::Value;

use crate::colors;
use crate::notebook_file;
use crate::runner::LiteralRunner;

/// Execute a notebook.
///
/// With `json` set, prints a machine-readable report instead.
pub async fn execute(
    notebook_path: &str,
    max_ticks: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let notebook = notebook_file::load(notebook_path)?;
    let config = EngineConfig {
        max_ticks,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(LiteralRunner, config);

    if json {
        engine.run_until_settled(&notebook).await?;
        println!("{}", serde_json::to_string_pretty(&report(&engine))?);
        return Ok(());
    }

    crate::print_header("Running", notebook_path);
    let ticks = engine.run_until_settled(&notebook).await?;

    if engine.cylinders().is_empty() {
        println!(
            "\n{}No code cells found in notebook.{}",
            colors::YELLOW,
            colors::RESET
        );
        return Ok(());
    }

    println!("\n{}Outputs:{}", colors::BOLD, colors::RESET);
    let mut failed = 0;
    for cell in notebook.code_cells() {
        let Some(snapshot) = engine.snapshot(cell.id) else {
            continue;
        };

        match (snapshot.status(), &snapshot.result) {
            (CellStatus::Error, Outcome::Throw(error)) => {
                failed += 1;
                println!(
                    "  {}✗{} {}: {}{}{}",
                    colors::RED,
                    colors::RESET,
                    cell.id,
                    colors::RED,
                    error,
                    colors::RESET
                );
            }
            (_, Outcome::Return(Some(bindings))) => {
                let sorted: BTreeMap<_, _> = bindings
                    .iter()
                    .map(|(name, value)| (name.as_str(), value))
                    .collect();
                println!(
                    "  {}✓{} {}: {}",
                    colors::GREEN,
                    colors::RESET,
                    cell.id,
                    serde_json::to_string(&sorted)?
                );
            }
            (status, _) => println!(
                "  {}-{} {}: {}{:?}{}",
                colors::DIM,
                colors::RESET,
                cell.id,
                colors::DIM,
                status,
                colors::RESET
            ),
        }
    }

    println!("\n{}", "─".repeat(50));
    println!(
        "{}Completed{} {} cells in {} ticks ({} failed) in {:.2}s",
        colors::GREEN,
        colors::RESET,
        engine.cylinders().len(),
        ticks,
        failed,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

#[derive(Debug, Serialize)]
struct CellReport {
    status: CellStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Final state of every cell, keyed by cell name.
fn report(engine: &Engine<LiteralRunner>) -> BTreeMap<String, CellReport> {
    engine
        .snapshots()
        .into_iter()
        .map(|snapshot| {
            let value = snapshot.result.bindings().map(|bindings| {
                bindings
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect()
            });
            let report = CellReport {
                status: snapshot.status(),
                value,
                error: snapshot.result.error().map(ToString::to_string),
            };
            (snapshot.id.to_string(), report)
        })
        .collect()
}
