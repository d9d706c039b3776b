//! Bounded worker pool shared by every bulk stage
//!
//! A stage pushes all of its units into a work queue, a fixed number of blocking
//! workers drain it, and each result is written into a pre-sized slot at the unit's
//! own index. The caller waits for every worker (the barrier) before any result is
//! handed back, so output order always matches input order.
//!
//! A panic inside one unit is caught and stored as that unit's failure; sibling
//! units keep running. Cancelling while the barrier is pending detaches the
//! workers and fails the whole stage with [`SimplifierError::StageInterrupted`].
//! Detached workers finish the unit they hold and take nothing further from the queue.

use crate::cancel::StageCancellation;
use crate::error::{Result, SimplifierError};
use crate::progress::{NoProgress, ProgressCounter, ProgressReporter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Result of one unit of work: its value, or the message of a caught panic
pub type UnitResult<R> = std::result::Result<R, String>;

/// Fixed-size pool of blocking workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Pool sized to the number of available CPUs
    pub fn with_available_parallelism() -> Self {
        Self::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        )
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` over every item and return results in item order
    pub(crate) async fn run<T, R, F>(
        &self,
        stage: &'static str,
        items: Vec<T>,
        work: F,
        progress: Arc<ProgressCounter>,
        cancel: &StageCancellation,
    ) -> Result<Vec<UnitResult<R>>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let total = items.len();
        if total == 0 {
            progress.finish_empty();
            return Ok(Vec::new());
        }

        let slots: Arc<Vec<Mutex<Option<UnitResult<R>>>>> =
            Arc::new((0..total).map(|_| Mutex::new(None)).collect());

        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<(usize, T)>();
        for unit in items.into_iter().enumerate() {
            // Receiver is held below, so the send cannot fail
            let _ = queue_tx.send(unit);
        }
        drop(queue_tx);
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let work = Arc::new(work);
        let worker_count = self.workers.min(total);
        tracing::debug!(stage, total, worker_count, "Dispatching stage to worker pool");

        let mut workers = JoinSet::new();
        for _ in 0..worker_count {
            let queue_rx = queue_rx.clone();
            let slots = slots.clone();
            let work = work.clone();
            let progress = progress.clone();
            let cancel = cancel.clone();
            workers.spawn_blocking(move || loop {
                // In-flight units finish after a cancel; queued ones are dropped
                if cancel.is_cancelled() {
                    break;
                }
                let next = queue_rx
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .blocking_recv();
                let Some((index, item)) = next else {
                    break;
                };

                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| work(item))).map_err(panic_message);
                *slots[index].lock().unwrap_or_else(|p| p.into_inner()) = Some(outcome);
                progress.increment();
            });
        }

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::warn!(
                        stage,
                        completed = progress.completed(),
                        total,
                        "Stage cancelled while waiting for workers"
                    );
                    workers.detach_all();
                    return Err(SimplifierError::StageInterrupted { stage });
                }

                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => tracing::error!(stage, "Worker terminated abnormally: {}", e),
                    None => break,
                }
            }
        }

        Ok(slots
            .iter()
            .map(|slot| {
                slot.lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .take()
                    .unwrap_or_else(|| Err("unit was never completed".to_string()))
            })
            .collect())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Everything a bulk stage needs besides its input
#[derive(Clone)]
pub struct StageOptions {
    pub pool: WorkerPool,
    pub progress: Arc<dyn ProgressReporter>,
    pub progress_interval: usize,
    pub cancel: StageCancellation,
}

impl StageOptions {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            pool,
            progress: Arc::new(NoProgress),
            progress_interval: 100,
            cancel: StageCancellation::new(),
        }
    }

    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>, interval: usize) -> Self {
        self.progress = reporter;
        self.progress_interval = interval;
        self
    }

    pub fn with_cancellation(mut self, cancel: StageCancellation) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn counter(&self, total: usize) -> Arc<ProgressCounter> {
        Arc::new(ProgressCounter::new(
            total,
            self.progress_interval,
            self.progress.clone(),
        ))
    }
}

impl Default for StageOptions {
    fn default() -> Self {
        Self::new(WorkerPool::default())
    }
}

impl std::fmt::Debug for StageOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageOptions")
            .field("pool", &self.pool)
            .field("progress_interval", &self.progress_interval)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
