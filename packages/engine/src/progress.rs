//! Progress reporting for bulk stages
//!
//! Every stage counts completed units with a shared atomic counter and notifies a
//! [`ProgressReporter`] on a fixed cadence, plus once when the last unit completes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives `(units_completed, units_total)` updates from a running stage
///
/// Workers call `report` concurrently, so updates may arrive out of order.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, completed: usize, total: usize);
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Reporter that discards all updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _completed: usize, _total: usize) {}
}

/// Atomic completion counter bound to a reporter and cadence
pub(crate) struct ProgressCounter {
    completed: AtomicUsize,
    total: usize,
    interval: usize,
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressCounter {
    pub(crate) fn new(total: usize, interval: usize, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            interval: interval.max(1),
            reporter,
        }
    }

    /// Record one completed unit, reporting on cadence or on the final unit
    pub(crate) fn increment(&self) {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if done % self.interval == 0 || done == self.total {
            self.reporter.report(done, self.total);
        }
    }

    /// Report an empty stage as complete
    pub(crate) fn finish_empty(&self) {
        if self.total == 0 {
            self.reporter.report(0, 0);
        }
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}
