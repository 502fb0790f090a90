//! Read-only views of cylinders for the UI layer.
//!
//! The engine publishes a [`CylinderEvent`] after every cylinder mutation.
//! Subscribers receive owned snapshots, so they never observe a cylinder
//! mid-update.

use serde::{Deserialize, Serialize};

use super::cylinder::{Cylinder, Outcome};
use crate::graph::CellId;
use crate::time::EngineTime;

/// Cell execution status, derived from a cylinder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Cell has not been executed.
    #[default]
    Idle,
    /// Cell is stale and queued behind other cells.
    Waiting,
    /// Cell is currently executing.
    Running,
    /// Cell completed successfully.
    Success,
    /// Cell threw, or cannot run.
    Error,
}

/// Point-in-time copy of a cylinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderSnapshot<V> {
    pub id: CellId,
    pub last_run: EngineTime,
    pub last_internal_run: EngineTime,
    pub running: bool,
    pub waiting: bool,
    pub result: Outcome<V>,
}

impl<V: Clone> CylinderSnapshot<V> {
    pub fn of(cylinder: &Cylinder<V>) -> Self {
        Self {
            id: cylinder.id(),
            last_run: cylinder.last_run(),
            last_internal_run: cylinder.last_internal_run(),
            running: cylinder.is_running(),
            waiting: cylinder.is_waiting(),
            result: cylinder.result().clone(),
        }
    }
}

impl<V> CylinderSnapshot<V> {
    pub fn status(&self) -> CellStatus {
        if self.running {
            CellStatus::Running
        } else if self.waiting {
            CellStatus::Waiting
        } else if self.last_internal_run == EngineTime::Earliest {
            CellStatus::Idle
        } else if self.result.is_throw() {
            CellStatus::Error
        } else {
            CellStatus::Success
        }
    }
}

/// Change notification published by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CylinderEvent<V> {
    /// A cell got its cylinder.
    Created { snapshot: CylinderSnapshot<V> },
    /// A cylinder changed.
    Updated { snapshot: CylinderSnapshot<V> },
    /// A cell left the notebook and its cylinder was dropped.
    Removed { id: CellId },
}

impl<V> CylinderEvent<V> {
    pub fn id(&self) -> CellId {
        match self {
            CylinderEvent::Created { snapshot } | CylinderEvent::Updated { snapshot } => snapshot.id,
            CylinderEvent::Removed { id } => *id,
        }
    }
}
