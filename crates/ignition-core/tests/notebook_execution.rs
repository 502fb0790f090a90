//! Integration tests for multi-cell notebook execution.
//!
//! Drives whole notebooks through the engine with a small formula runner.

use std::sync::{Arc, Mutex};

use ignition_core::blueprint::Architect;
use ignition_core::engine::{
    AbortHandle, Bindings, CellRunner, CellStatus, CylinderEvent, Engine, Outcome, RunRequest,
    evaluate,
};
use ignition_core::graph::{CellId, EdgeName, Port};
use ignition_core::notebook::{CompiledCell, Notebook};

// =============================================================================
// Test Helpers
// =============================================================================

type Body = Arc<dyn Fn(&Bindings<i64>) -> Result<i64, String> + Send + Sync>;

/// Compiled form of a test cell: one formula per exported name.
#[derive(Clone)]
struct Formula {
    exports: Vec<(&'static str, Body)>,
}

/// Runner evaluating [`Formula`]s and remembering what it was asked to do.
#[derive(Default)]
struct FormulaRunner {
    calls: Mutex<Vec<CellId>>,
    handles: Mutex<Vec<(CellId, AbortHandle)>>,
}

impl FormulaRunner {
    fn calls(&self) -> Vec<CellId> {
        self.calls.lock().unwrap().clone()
    }

    fn handle(&self, id: CellId) -> AbortHandle {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(cell, _)| *cell == id)
            .map(|(_, handle)| handle.clone())
            .expect("cell never ran")
    }
}

impl CellRunner for FormulaRunner {
    type Code = Formula;
    type Value = i64;

    fn run(
        &self,
        request: RunRequest<Formula, i64>,
    ) -> impl Future<Output = Result<Bindings<i64>, String>> + Send {
        self.calls.lock().unwrap().push(request.id);
        self.handles
            .lock()
            .unwrap()
            .push((request.id, request.abort.clone()));

        let mut bindings = Bindings::default();
        let mut result = Ok(());
        for (name, body) in &request.code.exports {
            match body(&request.inputs) {
                Ok(value) => {
                    bindings.insert(EdgeName::new(*name), value);
                }
                Err(message) => {
                    result = Err(message);
                    break;
                }
            }
        }
        std::future::ready(result.map(|()| bindings))
    }
}

fn input(inputs: &Bindings<i64>, name: &str) -> Result<i64, String> {
    inputs
        .get(name)
        .copied()
        .ok_or_else(|| format!("{} is not defined", name))
}

/// A cell exporting `name = constant`.
fn constant(name: &'static str, value: i64) -> CompiledCell<Formula> {
    CompiledCell::new(Formula {
        exports: vec![(name, Arc::new(move |_: &Bindings<i64>| Ok::<i64, String>(value)) as Body)],
    })
    .with_export(Port::named(name))
}

/// A cell exporting `name = from + offset`.
fn plus(name: &'static str, from: &'static str, offset: i64) -> CompiledCell<Formula> {
    CompiledCell::new(Formula {
        exports: vec![(
            name,
            Arc::new(move |inputs: &Bindings<i64>| -> Result<i64, String> {
                Ok(input(inputs, from)? + offset)
            }) as Body,
        )],
    })
    .with_import(Port::named(from))
    .with_export(Port::named(name))
}

fn value(engine: &Engine<FormulaRunner>, id: CellId, name: &str) -> Option<i64> {
    engine
        .snapshot(id)?
        .result
        .bindings()?
        .get(name)
        .copied()
}

fn stale(engine: &Engine<FormulaRunner>, notebook: &Notebook<Formula>) -> Vec<CellId> {
    let blueprint = Architect::draft(notebook);
    evaluate(&blueprint, engine.cylinders()).stale().to_vec()
}

fn message(engine: &Engine<FormulaRunner>, id: CellId) -> String {
    engine
        .snapshot(id)
        .and_then(|snapshot| snapshot.result.error().map(ToString::to_string))
        .unwrap_or_default()
}

/// Notebook `a = 1; b = a + 1`.
fn two_cells() -> (Notebook<Formula>, CellId, CellId) {
    let mut notebook = Notebook::new();
    let a = notebook.add_code(Ok(constant("a", 1)));
    let b = notebook.add_code(Ok(plus("b", "a", 1)));
    (notebook, a, b)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_two_cell_notebook() {
    let (notebook, a, b) = two_cells();
    let mut engine = Engine::new(FormulaRunner::default());

    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(engine.runner().calls(), vec![a, b]);
    assert_eq!(value(&engine, a, "a"), Some(1));
    assert_eq!(value(&engine, b, "b"), Some(2));
    assert_eq!(engine.snapshot(b).unwrap().status(), CellStatus::Success);
}

#[tokio::test]
async fn test_settled_notebook_stays_settled() {
    let (notebook, _, _) = two_cells();
    let mut engine = Engine::new(FormulaRunner::default());
    engine.run_until_settled(&notebook).await.unwrap();

    for _ in 0..3 {
        let tick = engine.tick(&notebook).await;
        assert!(tick.is_settled());
    }
    assert_eq!(engine.runner().calls().len(), 2);
    assert_eq!(engine.run_until_settled(&notebook).await.unwrap(), 0);
}

#[tokio::test]
async fn test_request_reruns_cell_and_consumers() {
    let (mut notebook, a, b) = two_cells();
    let c = notebook.add_code(Ok(constant("c", 7)));
    let mut engine = Engine::new(FormulaRunner::default());
    engine.run_until_settled(&notebook).await.unwrap();

    notebook.request_run(a).unwrap();
    assert_eq!(stale(&engine, &notebook), vec![a, b]);

    engine.run_until_settled(&notebook).await.unwrap();
    assert_eq!(engine.runner().calls()[3..], [a, b]);
    assert!(!engine.runner().calls()[3..].contains(&c));
}

#[tokio::test]
async fn test_edit_propagates_new_value() {
    let (mut notebook, a, b) = two_cells();
    let mut engine = Engine::new(FormulaRunner::default());
    engine.run_until_settled(&notebook).await.unwrap();

    notebook.update_code(a, Ok(constant("a", 10))).unwrap();
    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(value(&engine, b, "b"), Some(11));
}

#[tokio::test]
async fn test_deleted_producer_forces_consumer_rerun() {
    let (mut notebook, a, b) = two_cells();
    let mut engine = Engine::new(FormulaRunner::default());
    engine.run_until_settled(&notebook).await.unwrap();
    let handle = engine.runner().handle(a);

    notebook.remove(a).unwrap();
    assert_eq!(stale(&engine, &notebook), vec![b]);

    engine.run_until_settled(&notebook).await.unwrap();
    assert!(engine.snapshot(a).is_none());
    assert!(handle.is_aborted());
    assert_eq!(message(&engine, b), "a is not defined");
    assert_eq!(engine.snapshot(b).unwrap().status(), CellStatus::Error);
}

#[tokio::test]
async fn test_cycle_becomes_mistakes() {
    let mut notebook = Notebook::new();
    let x = notebook.add_code(Ok(plus("x", "y", 1)));
    let y = notebook.add_code(Ok(plus("y", "x", 1)));
    let mut engine = Engine::new(FormulaRunner::default());

    engine.run_until_settled(&notebook).await.unwrap();

    assert!(engine.runner().calls().is_empty());
    assert_eq!(message(&engine, x), "Cyclical dependency (`x` -> `y` -> `x`)");
    assert_eq!(message(&engine, y), "Cyclical dependency (`y` -> `x` -> `y`)");
}

#[tokio::test]
async fn test_breaking_cycle_reruns_both_cells() {
    let mut notebook = Notebook::new();
    let x = notebook.add_code(Ok(plus("x", "y", 1)));
    let y = notebook.add_code(Ok(plus("y", "x", 1)));
    let mut engine = Engine::new(FormulaRunner::default());
    engine.run_until_settled(&notebook).await.unwrap();

    notebook.update_code(y, Ok(constant("y", 5))).unwrap();
    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(engine.runner().calls(), vec![y, x]);
    assert_eq!(value(&engine, y, "y"), Some(5));
    assert_eq!(value(&engine, x, "x"), Some(6));
}

#[tokio::test]
async fn test_conflicting_definitions() {
    let mut notebook = Notebook::new();
    let first = notebook.add_code(Ok(constant("x", 1)));
    let second = notebook.add_code(Ok(constant("x", 2)));
    let reader = notebook.add_code(Ok(plus("z", "x", 0)));
    let mut engine = Engine::new(FormulaRunner::default());

    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(message(&engine, first), "Multiple definitions of `x`");
    assert_eq!(message(&engine, second), "Multiple definitions of `x`");
    // both producers are mistakes, so the reader runs without `x`
    assert_eq!(message(&engine, reader), "x is not defined");
}

#[tokio::test]
async fn test_compile_error_is_reported() {
    let mut notebook = Notebook::new();
    let broken = notebook.add_code(Err("Unexpected token (1:4)".to_string()));
    notebook.add_text("# Notes");
    let mut engine = Engine::new(FormulaRunner::default());

    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(message(&engine, broken), "Unexpected token (1:4)");
    assert_eq!(engine.cylinders().len(), 1);
}

#[tokio::test]
async fn test_top_level_return_is_reported() {
    let mut notebook = Notebook::new();
    let mut compiled = constant("a", 1);
    compiled.has_top_level_return = true;
    let id = notebook.add_code(Ok(compiled));
    let mut engine = Engine::new(FormulaRunner::default());

    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(message(&engine, id), "Top level return statements are not allowed");
    assert!(engine.runner().calls().is_empty());
}

#[tokio::test]
async fn test_latest_request_runs_first() {
    let mut notebook = Notebook::new();
    let a = notebook.add_code(Ok(constant("a", 1)));
    let b = notebook.add_code(Ok(constant("b", 2)));
    let mut engine = Engine::new(FormulaRunner::default());
    engine.run_until_settled(&notebook).await.unwrap();

    notebook.request_run(a).unwrap();
    notebook.request_run(b).unwrap();
    engine.run_until_settled(&notebook).await.unwrap();

    assert_eq!(engine.runner().calls()[2..], [b, a]);
}

#[tokio::test]
async fn test_events_follow_cylinder_changes() {
    let (mut notebook, a, b) = two_cells();
    let mut engine = Engine::new(FormulaRunner::default());
    let mut events = engine.subscribe();

    engine.run_until_settled(&notebook).await.unwrap();
    notebook.remove(b).unwrap();
    engine.run_until_settled(&notebook).await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(&received[0], CylinderEvent::Created { snapshot } if snapshot.id == a));
    assert!(matches!(&received[1], CylinderEvent::Created { snapshot } if snapshot.id == b));
    assert!(received.iter().any(|event| matches!(
        event,
        CylinderEvent::Updated { snapshot } if snapshot.id == a && snapshot.running
    )));
    assert!(received.iter().any(|event| matches!(
        event,
        CylinderEvent::Updated { snapshot }
            if snapshot.id == b && matches!(snapshot.result, Outcome::Return(Some(_)))
    )));
    assert!(matches!(received.last(), Some(CylinderEvent::Removed { id }) if *id == b));
}
