//! Cell execution engine.
//!
//! The [`Engine`] owns one [`Cylinder`] per code cell and advances the
//! notebook one tick at a time: evaluate staleness, pick what runs, run it.

mod context;
mod cylinder;
mod events;
mod executor;
mod picker;
mod runner;
mod staleness;

pub use context::AbortHandle;
pub use cylinder::{Cylinder, CylinderStore, Outcome};
pub use events::{CellStatus, CylinderEvent, CylinderSnapshot};
pub use executor::{Engine, EngineConfig, Tick};
pub use picker::{Pick, pick};
pub use runner::{Bindings, CellRunner, RunRequest};
pub use staleness::{Staleness, evaluate};
