//! Message types for worker controller lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The controller spawned its pool of worker threads.
pub struct WorkersStarted {
    pub n_workers: usize,
}

impl Display for WorkersStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "started {} worker thread(s)", self.n_workers)
    }
}

impl StructuredLog for WorkersStarted {
    fn log(&self) {
        tracing::info!(n_workers = self.n_workers, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("workers_started", span_name = name, n_workers = self.n_workers)
    }
}

/// All workers reported `finished` and the controller stopped its run loop.
pub struct WorkersFinished {
    pub n_workers: usize,
    pub tasks_completed: usize,
}

impl Display for WorkersFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} worker(s) finished, {} task(s) completed",
            self.n_workers, self.tasks_completed
        )
    }
}

impl StructuredLog for WorkersFinished {
    fn log(&self) {
        tracing::info!(n_workers = self.n_workers, tasks_completed = self.tasks_completed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("workers_finished", span_name = name, n_workers = self.n_workers)
    }
}

/// A worker signalled that it aborted its cycle (stop signal or task panic).
pub struct WorkerAborted {
    pub worker_id: usize,
    pub reason: String,
}

impl Display for WorkerAborted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "worker {} aborted: {}", self.worker_id, self.reason)
    }
}

impl StructuredLog for WorkerAborted {
    fn log(&self) {
        tracing::warn!(worker_id = self.worker_id, reason = %self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("worker_aborted", span_name = name, worker_id = self.worker_id)
    }
}
