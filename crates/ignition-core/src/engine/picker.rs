//! Choosing what runs next.

use super::cylinder::CylinderStore;
use super::staleness::Staleness;
use crate::blueprint::{Blueprint, Chamber};
use crate::graph::CellId;
use crate::time::EngineTime;

/// What the engine should execute in the current tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pick {
    /// Stale mistakes. They cost nothing to fire, so all of them go at once.
    pub mistakes: Vec<CellId>,
    /// The one chamber to hand to the runner.
    pub chamber: Option<CellId>,
}

impl Pick {
    pub fn is_empty(&self) -> bool {
        self.mistakes.is_empty() && self.chamber.is_none()
    }
}

/// Pick the stale mistakes and at most one stale chamber.
///
/// A chamber is a candidate only when none of its input chambers is stale.
/// The first candidate in topological order is the default; a candidate the
/// user explicitly asked to run replaces it when that request is newer.
pub fn pick<C, V>(
    blueprint: &Blueprint<C>,
    staleness: &Staleness,
    cylinders: &CylinderStore<V>,
) -> Pick {
    let mistakes = blueprint
        .mistakes()
        .iter()
        .map(|mistake| mistake.id)
        .filter(|&id| staleness.is_stale(id))
        .collect();

    let candidates = blueprint.chambers().iter().filter(|chamber| {
        staleness.is_stale(chamber.id)
            && !chamber
                .node
                .input_ids()
                .any(|input| staleness.is_stale(input) && blueprint.chamber(input).is_some())
    });

    let mut chosen: Option<&Chamber<C>> = None;
    for candidate in candidates {
        match chosen {
            None => chosen = Some(candidate),
            Some(current) => {
                if explicitly_requested(candidate, cylinders)
                    && candidate.requested_run_time > current.requested_run_time
                {
                    chosen = Some(candidate);
                }
            }
        }
    }

    Pick {
        mistakes,
        chamber: chosen.map(|chamber| chamber.id),
    }
}

fn explicitly_requested<C, V>(chamber: &Chamber<C>, cylinders: &CylinderStore<V>) -> bool {
    let last_run = cylinders
        .get(chamber.id)
        .map(|cylinder| cylinder.last_run())
        .unwrap_or(EngineTime::Earliest);
    chamber.requested_run_time != last_run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Architect;
    use crate::engine::staleness::evaluate;
    use crate::graph::Port;
    use crate::notebook::{CompiledCell, Notebook};

    fn code(imports: &[&str], exports: &[&str]) -> CompiledCell<()> {
        let mut compiled = CompiledCell::new(());
        for name in imports {
            compiled = compiled.with_import(Port::named(*name));
        }
        for name in exports {
            compiled = compiled.with_export(Port::named(*name));
        }
        compiled
    }

    fn settle(notebook: &Notebook<()>, store: &mut CylinderStore<i64>) {
        let blueprint = Architect::draft(notebook);
        for unit in blueprint.units() {
            store.ensure(unit.id());
            let cylinder = store.get_mut(unit.id()).unwrap();
            cylinder.last_run = unit.requested_run_time();
            cylinder.last_internal_run = EngineTime::At(1);
        }
    }

    fn pick_for(notebook: &Notebook<()>, store: &CylinderStore<i64>) -> Pick {
        let blueprint = Architect::draft(notebook);
        let staleness = evaluate(&blueprint, store);
        pick(&blueprint, &staleness, store)
    }

    #[test]
    fn test_upstream_runs_first() {
        let mut notebook = Notebook::new();
        notebook.add_code(Ok(code(&["a"], &["b"])));
        let a = notebook.add_code(Ok(code(&[], &["a"])));

        let pick = pick_for(&notebook, &CylinderStore::new());
        assert_eq!(pick.chamber, Some(a));
        assert!(pick.mistakes.is_empty());
    }

    #[test]
    fn test_nothing_to_pick_when_settled() {
        let mut notebook = Notebook::new();
        notebook.add_code(Ok(code(&[], &["a"])));

        let mut store = CylinderStore::new();
        settle(&notebook, &mut store);
        assert!(pick_for(&notebook, &store).is_empty());
    }

    #[test]
    fn test_latest_explicit_request_wins() {
        let mut notebook = Notebook::new();
        let a = notebook.add_code(Ok(code(&[], &["a"])));
        let b = notebook.add_code(Ok(code(&[], &["b"])));
        let c = notebook.add_code(Ok(code(&[], &["c"])));

        let mut store = CylinderStore::new();
        settle(&notebook, &mut store);
        notebook.request_run(c).unwrap();
        notebook.request_run(a).unwrap();
        notebook.request_run(b).unwrap();

        assert_eq!(pick_for(&notebook, &store).chamber, Some(b));
    }

    #[test]
    fn test_propagated_staleness_does_not_override() {
        let mut notebook = Notebook::new();
        let c = notebook.add_code(Ok(code(&[], &["c"])));
        let a = notebook.add_code(Ok(code(&[], &["a"])));
        let b = notebook.add_code(Ok(code(&["a"], &["b"])));

        let mut store = CylinderStore::new();
        settle(&notebook, &mut store);
        notebook.request_run(c).unwrap();
        let newer = notebook.request_run(b).unwrap();

        // b's request is already satisfied; it is stale only because a ran later
        store.get_mut(b).unwrap().last_run = newer;
        store.get_mut(a).unwrap().last_internal_run = EngineTime::At(5);

        let pick = pick_for(&notebook, &store);
        assert_eq!(pick.chamber, Some(c));
    }

    #[test]
    fn test_all_stale_mistakes_fire() {
        let mut notebook = Notebook::new();
        let first = notebook.add_code(Err("one".to_string()));
        let second = notebook.add_code(Err("two".to_string()));
        let ok = notebook.add_code(Ok(code(&[], &["z"])));

        let pick = pick_for(&notebook, &CylinderStore::new());
        assert_eq!(pick.mistakes, vec![first, second]);
        assert_eq!(pick.chamber, Some(ok));
    }
}
