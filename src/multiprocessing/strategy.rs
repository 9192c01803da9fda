//! How a [`super::WorkerController`] populates its task list and spawns
//! worker threads -- the generic stand-in for the original's subclassing
//! of `WorkerController` into `AppRunner`.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::app::{AppResult, BaseApp};
use crate::errors::AppError;
use crate::plugin::Task;

use super::processor::{run_app_processor, run_task_processor};
use super::queues::WorkerQueues;

/// Supplies the controller with its initial task list and knows how to
/// spawn one worker thread.
pub trait WorkerPoolStrategy: Send + 'static {
    /// Called once at the start of each run. Returning a non-empty list
    /// queues those tasks; tasks-less strategies return an empty list and
    /// rely on tasks being submitted externally via `add_task`/`add_tasks`.
    fn pre_run(&mut self) -> Result<Vec<Task>, AppError>;

    /// Spawn one worker thread bound to the given queue handles.
    fn spawn_worker(&self, queues: WorkerQueues) -> JoinHandle<()>;

    /// Called once after every worker has joined.
    fn post_run(&mut self);
}

/// Runs a plain function per task -- the direct analogue of the
/// original's bare `processor()` loop.
pub struct FunctionPoolStrategy {
    function: Arc<dyn Fn(Task) -> Result<AppResult, AppError> + Send + Sync>,
}

impl FunctionPoolStrategy {
    pub fn new(function: Arc<dyn Fn(Task) -> Result<AppResult, AppError> + Send + Sync>) -> Self {
        Self { function }
    }
}

impl WorkerPoolStrategy for FunctionPoolStrategy {
    fn pre_run(&mut self) -> Result<Vec<Task>, AppError> {
        Ok(Vec::new())
    }

    fn spawn_worker(&self, queues: WorkerQueues) -> JoinHandle<()> {
        let function = self.function.clone();
        std::thread::spawn(move || run_task_processor(queues, function))
    }

    fn post_run(&mut self) {}
}

/// Runs an independent clone of a [`BaseApp`] per worker -- the analogue
/// of `AppRunner`/`app_processor`.
pub struct AppPoolStrategy {
    app: Box<dyn BaseApp>,
    tasks_less: bool,
}

impl AppPoolStrategy {
    pub fn new(app: Box<dyn BaseApp>, tasks_less: bool) -> Self {
        Self { app, tasks_less }
    }

    pub fn app(&self) -> &dyn BaseApp {
        self.app.as_ref()
    }
}

impl WorkerPoolStrategy for AppPoolStrategy {
    fn pre_run(&mut self) -> Result<Vec<Task>, AppError> {
        // Call on the controller's own copy too, mirroring AppRunner's
        // `_cycle_pre_run`, which sets up tasks from the controller side
        // in addition to each worker's independent `multiprocessing_pre_run`.
        self.app.multiprocessing_pre_run()?;
        Ok(self.app.multiprocessing_get_tasks())
    }

    fn spawn_worker(&self, queues: WorkerQueues) -> JoinHandle<()> {
        let app = self.app.copy(true);
        let tasks_less = self.tasks_less;
        std::thread::spawn(move || run_app_processor(app, queues, tasks_less))
    }

    fn post_run(&mut self) {
        self.app.multiprocessing_post_run();
    }
}
