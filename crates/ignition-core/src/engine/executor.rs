//! The engine: one scheduler tick at a time.
//!
//! A tick drafts a blueprint from the notebook, finds stale cells, fires the
//! stale mistakes, and hands at most one chamber to the runner. Ticks repeat
//! until nothing is stale.

use tokio::sync::broadcast;

use super::context::AbortHandle;
use super::cylinder::{CylinderStore, Outcome};
use super::events::{CylinderEvent, CylinderSnapshot};
use super::picker::pick;
use super::runner::{Bindings, CellRunner, RunRequest};
use super::staleness::evaluate;
use crate::blueprint::{Architect, Blueprint};
use crate::error::{CellError, Error, Result};
use crate::graph::{CellId, GraphNode};
use crate::notebook::Notebook;
use crate::time::{EngineClock, EngineTime};

/// Capacity for the event channel.
/// If subscribers fall behind, older events are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Buffered events per subscriber.
    pub event_capacity: usize,
    /// Give up `run_until_settled` after this many working ticks.
    pub max_ticks: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_capacity: EVENT_CHANNEL_CAPACITY,
            max_ticks: None,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tick {
    /// Engine time stamped on everything that ran.
    pub time: EngineTime,
    /// Cells found stale at the start of the tick.
    pub stale: Vec<CellId>,
    /// Mistakes that fired.
    pub fired: Vec<CellId>,
    /// Chamber handed to the runner.
    pub ran: Option<CellId>,
    /// Cells whose cylinders were dropped.
    pub removed: Vec<CellId>,
}

impl Tick {
    /// Nothing was stale.
    pub fn is_settled(&self) -> bool {
        self.stale.is_empty()
    }

    /// Something fired or ran.
    pub fn made_progress(&self) -> bool {
        !self.fired.is_empty() || self.ran.is_some()
    }
}

/// Reactive scheduler driving a [`CellRunner`].
///
/// Owns every cylinder exclusively; the UI observes them through
/// [`Engine::snapshot`] and [`Engine::subscribe`].
pub struct Engine<R: CellRunner> {
    runner: R,
    cylinders: CylinderStore<R::Value>,
    clock: EngineClock,
    config: EngineConfig,
    events: broadcast::Sender<CylinderEvent<R::Value>>,
}

impl<R: CellRunner> Engine<R> {
    /// Create an engine with the default configuration.
    pub fn new(runner: R) -> Self {
        Self::with_config(runner, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(runner: R, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            runner,
            cylinders: CylinderStore::new(),
            clock: EngineClock::new(),
            config,
            events,
        }
    }

    /// Subscribe to cylinder change events.
    pub fn subscribe(&self) -> broadcast::Receiver<CylinderEvent<R::Value>> {
        self.events.subscribe()
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cylinders(&self) -> &CylinderStore<R::Value> {
        &self.cylinders
    }

    /// Time of the most recent tick.
    pub fn now(&self) -> EngineTime {
        self.clock.now()
    }

    /// Snapshot of one cell's cylinder.
    pub fn snapshot(&self, id: CellId) -> Option<CylinderSnapshot<R::Value>> {
        self.cylinders.get(id).map(CylinderSnapshot::of)
    }

    /// Snapshots of every cylinder, by ascending cell id.
    pub fn snapshots(&self) -> Vec<CylinderSnapshot<R::Value>> {
        self.cylinders
            .ids()
            .into_iter()
            .filter_map(|id| self.snapshot(id))
            .collect()
    }

    /// Signal every cell's current run to stop.
    pub fn abort_all(&self) {
        for cylinder in self.cylinders.iter() {
            cylinder.abort_handle().abort();
        }
    }

    /// Run ticks until one finds nothing stale.
    ///
    /// Returns the number of ticks that ran something.
    pub async fn run_until_settled(&mut self, notebook: &Notebook<R::Code>) -> Result<usize> {
        let mut ticks = 0;
        loop {
            let tick = self.tick(notebook).await;
            if tick.is_settled() {
                break;
            }
            if !tick.made_progress() {
                tracing::warn!(
                    "{} stale cells but none can run: {:?}",
                    tick.stale.len(),
                    tick.stale
                );
                break;
            }

            ticks += 1;
            if let Some(max) = self.config.max_ticks {
                if ticks >= max {
                    return Err(Error::TickLimit(max));
                }
            }
        }

        tracing::info!("Notebook settled after {} ticks", ticks);
        Ok(ticks)
    }

    /// Run one scheduler tick.
    pub async fn tick(&mut self, notebook: &Notebook<R::Code>) -> Tick {
        for cell in notebook.code_cells() {
            if self.cylinders.ensure(cell.id) {
                self.notify(cell.id, |snapshot| CylinderEvent::Created { snapshot });
            }
        }

        let blueprint = Architect::draft(notebook);
        let staleness = evaluate(&blueprint, &self.cylinders);
        let choice = pick(&blueprint, &staleness, &self.cylinders);

        let removed = self.remove_deleted(notebook).await;
        let now = self.clock.advance();

        let mut tick = Tick {
            time: now,
            stale: staleness.stale().to_vec(),
            removed,
            ..Tick::default()
        };

        if !tick.stale.is_empty() {
            tracing::debug!(
                "Tick {}: {} stale, firing {} mistakes, running {:?}",
                now,
                tick.stale.len(),
                choice.mistakes.len(),
                choice.chamber
            );
        }

        self.update_waiting(&blueprint, &tick.stale, &choice.mistakes, choice.chamber);

        for id in choice.mistakes {
            if let Some(mistake) = blueprint.mistake(id) {
                let (_, upstream) = self.gather_inputs(&mistake.node);
                self.complete(
                    id,
                    mistake.requested_run_time,
                    now,
                    upstream,
                    Outcome::Throw(mistake.error.clone()),
                );
                tick.fired.push(id);
            }
        }

        if let Some(id) = choice.chamber {
            if self.run_chamber(&blueprint, id, now).await {
                tick.ran = Some(id);
            }
        }

        tick
    }

    /// Drop cylinders of cells that are no longer code cells in the notebook.
    async fn remove_deleted(&mut self, notebook: &Notebook<R::Code>) -> Vec<CellId> {
        let gone: Vec<CellId> = self
            .cylinders
            .ids()
            .into_iter()
            .filter(|&id| !notebook.cell(id).is_some_and(|cell| cell.is_code()))
            .collect();

        for &id in &gone {
            if let Some(cylinder) = self.cylinders.get(id) {
                cylinder.abort_handle().abort();
            }
            // let the cell's run observe the abort before its state goes away
            tokio::task::yield_now().await;
            self.cylinders.remove(id);
            tracing::debug!("Removed cylinder for {}", id);
            let _ = self.events.send(CylinderEvent::Removed { id });
        }

        gone
    }

    fn update_waiting(
        &mut self,
        blueprint: &Blueprint<R::Code>,
        stale: &[CellId],
        fired: &[CellId],
        running: Option<CellId>,
    ) {
        for &id in blueprint.order() {
            let waiting = stale.contains(&id) && !fired.contains(&id) && running != Some(id);
            let changed = match self.cylinders.get_mut(id) {
                Some(cylinder) if cylinder.waiting != waiting => {
                    cylinder.waiting = waiting;
                    true
                }
                _ => false,
            };
            if changed {
                self.notify(id, |snapshot| CylinderEvent::Updated { snapshot });
            }
        }
    }

    /// Execute a chamber through the runner. Returns whether it ran.
    async fn run_chamber(&mut self, blueprint: &Blueprint<R::Code>, id: CellId, now: EngineTime) -> bool {
        let Some(chamber) = blueprint.chamber(id) else {
            return false;
        };
        let (inputs, upstream) = self.gather_inputs(&chamber.node);

        let abort = {
            let Some(cylinder) = self.cylinders.get_mut(id) else {
                tracing::warn!("No cylinder for {}", id);
                return false;
            };
            cylinder.running = true;
            cylinder.waiting = false;
            cylinder.abort.abort();
            cylinder.abort = AbortHandle::new();
            cylinder.abort.clone()
        };
        self.notify(id, |snapshot| CylinderEvent::Updated { snapshot });

        // give the previous run a turn to clean up after its abort
        tokio::task::yield_now().await;

        tracing::info!("Running {}", id);
        let request = RunRequest {
            id,
            code: chamber.code.clone(),
            inputs,
            abort,
        };
        let result = match self.runner.run(request).await {
            Ok(bindings) => Outcome::Return(Some(bindings)),
            Err(message) => {
                tracing::debug!("{} threw: {}", id, message);
                Outcome::Throw(CellError::Runtime(message))
            }
        };

        self.complete(id, chamber.requested_run_time, now, upstream, result);
        true
    }

    /// Values for a node's imports, and the cells consulted for them.
    fn gather_inputs(&self, node: &GraphNode) -> (Bindings<R::Value>, Vec<CellId>) {
        let mut inputs = Bindings::default();
        let mut upstream = Vec::new();

        for (from, edge) in &node.inputs {
            let Some(cylinder) = self.cylinders.get(*from) else {
                continue;
            };
            if !upstream.contains(from) {
                upstream.push(*from);
            }
            if let Some(value) = cylinder.variables().get(&edge.input) {
                inputs.insert(edge.input.clone(), value.clone());
            }
        }

        (inputs, upstream)
    }

    /// Record a finished run.
    fn complete(
        &mut self,
        id: CellId,
        requested_run_time: EngineTime,
        now: EngineTime,
        upstream: Vec<CellId>,
        result: Outcome<R::Value>,
    ) {
        let Some(cylinder) = self.cylinders.get_mut(id) else {
            tracing::warn!("Cylinder for {} vanished during its run", id);
            return;
        };

        debug_assert!(now >= cylinder.last_internal_run);
        cylinder.variables = match &result {
            Outcome::Return(Some(bindings)) => bindings
                .iter()
                .filter(|(name, _)| !name.is_default())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => Bindings::default(),
        };
        cylinder.last_run = requested_run_time;
        cylinder.last_internal_run = now;
        cylinder.upstream_cells = upstream;
        cylinder.result = result;
        cylinder.running = false;
        cylinder.waiting = false;

        self.notify(id, |snapshot| CylinderEvent::Updated { snapshot });
    }

    fn notify(
        &self,
        id: CellId,
        event: impl FnOnce(CylinderSnapshot<R::Value>) -> CylinderEvent<R::Value>,
    ) {
        if let Some(snapshot) = self.snapshot(id) {
            // no subscribers is fine
            let _ = self.events.send(event(snapshot));
        }
    }
}
