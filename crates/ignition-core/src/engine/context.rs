//! Cooperative cancellation for cell runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation flag for one run of one cell.
///
/// The engine hands each run its own handle. It aborts that handle when the
/// cell is scheduled again or removed from the notebook, so a runner still
/// working on stale inputs can stop and its result will be dropped anyway.
///
/// ```
/// use ignition_core::engine::AbortHandle;
///
/// fn sum_rows(rows: &[i64], abort: &AbortHandle) -> Option<i64> {
///     let mut total = 0;
///     for row in rows {
///         if abort.is_aborted() {
///             return None;
///         }
///         total += row;
///     }
///     Some(total)
/// }
///
/// let run = AbortHandle::new();
/// assert_eq!(sum_rows(&[1, 2, 3], &run), Some(6));
///
/// // the engine keeps a clone and flips it when the cell reruns
/// let engine_side = run.clone();
/// engine_side.abort();
/// assert_eq!(sum_rows(&[1, 2, 3], &run), None);
/// ```
#[derive(Clone, Default, Debug)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// A handle that has not been aborted.
    pub fn new() -> Self {
        Self {
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True once the run this handle belongs to has been superseded.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Mark the run as superseded. Every clone observes it.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }
}
