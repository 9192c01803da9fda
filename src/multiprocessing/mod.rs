//! The worker pool: five queues (input, output, stop, finished, and an
//! outward event bus standing in for "signal"), a cooperative controller
//! loop, and the per-worker processor functions it spawns onto OS threads.
//!
//! pydidas spawns real OS processes here because CPython's GIL blocks
//! CPU-bound parallelism inside one process. Rust has no such limitation,
//! so `std::thread` plus `crossbeam_channel` gives the same queue/cancel/
//! ordering contract without the cost of process isolation nothing here
//! needs.

mod controller;
#[cfg(test)]
mod integration_tests;
mod processor;
mod queues;
mod strategy;

pub use controller::{ControllerEvent, ControllerState, WorkerController};
pub use processor::{run_app_processor, run_task_processor};
pub use queues::WorkerQueues;
pub use strategy::{AppPoolStrategy, FunctionPoolStrategy, WorkerPoolStrategy};

/// A [`WorkerController`] specialised to drive a [`crate::app::BaseApp`].
///
/// The original has `AppRunner` subclass `WorkerController` and override
/// `_cycle_pre_run`/`_cycle_post_run`. Rust has no implementation
/// inheritance, so the same specialization is expressed as a generic
/// parameter: `AppRunner` is `WorkerController<AppPoolStrategy>`, not a
/// separate type.
pub type AppRunner = WorkerController<AppPoolStrategy>;

/// Build an [`AppRunner`] from an app and a worker count.
pub fn new_app_runner(
    app: Box<dyn crate::app::BaseApp>,
    n_workers: usize,
    tasks_less: bool,
) -> AppRunner {
    WorkerController::new(n_workers, AppPoolStrategy::new(app, tasks_less))
}
