//! The per-worker loops. `run_task_processor` calls a plain function per
//! task; `run_app_processor` drives a [`crate::app::BaseApp`] through its
//! fixed lifecycle, optionally in "tasks-less" mode where the app itself
//! decides when it has something to do rather than being handed a task.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::app::{AppResult, BaseApp};
use crate::errors::AppError;
use crate::plugin::Task;

use super::queues::WorkerQueues;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Call `function` once per task pulled from `queues.input_rx`, writing
/// `[task, result]`-shaped pairs to `queues.output_tx`. Exits on a `None`
/// sentinel (the poison pill queued by
/// [`super::WorkerController::finalize_tasks`]) or on a stop signal.
pub fn run_task_processor(
    queues: WorkerQueues,
    function: Arc<dyn Fn(Task) -> Result<AppResult, AppError> + Send + Sync>,
) {
    loop {
        if queues.stop_rx.try_recv().is_ok() {
            let _ = queues.finished_tx.send(());
            return;
        }
        match queues.input_rx.recv_timeout(POLL_INTERVAL) {
            Ok(None) => {
                let _ = queues.finished_tx.send(());
                return;
            }
            Ok(Some(task)) => match function(task) {
                Ok(result) => {
                    let _ = queues.output_tx.send((task, Ok(result)));
                }
                Err(err) => {
                    // A brief pause here mirrors the original's note that
                    // the queues can otherwise end up corrupted if the
                    // process tears down immediately after a failed call.
                    std::thread::sleep(Duration::from_millis(20));
                    let _ = queues.output_tx.send((task, Err(err)));
                    let _ = queues.finished_tx.send(());
                    return;
                }
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Drive one `BaseApp` instance through its multiprocessing lifecycle.
///
/// When `tasks_less` is false (the common case), a task is pulled from the
/// input queue before every `multiprocessing_carryon` check. When true,
/// the app manages its own task state across calls and the worker simply
/// keeps calling `multiprocessing_carryon`/`multiprocessing_func` without
/// waiting on new input -- the tasks-less variant from the original.
pub fn run_app_processor(mut app: Box<dyn BaseApp>, queues: WorkerQueues, tasks_less: bool) {
    if let Err(err) = app.multiprocessing_pre_run() {
        let _ = queues.output_tx.send((Task::Taskless, Err(err)));
        let _ = queues.finished_tx.send(());
        return;
    }
    let mut carryon = true;
    let mut current: Option<Task> = None;
    loop {
        if queues.stop_rx.try_recv().is_ok() {
            break;
        }
        if carryon || current.is_none() {
            match queues.input_rx.recv_timeout(POLL_INTERVAL) {
                Ok(None) => break,
                Ok(Some(task)) => {
                    app.multiprocessing_pre_cycle(task);
                    current = Some(task);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !tasks_less {
                        continue;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        carryon = app.multiprocessing_carryon();
        if carryon {
            if let Some(task) = current {
                let result = app.multiprocessing_func(task);
                let _ = queues.output_tx.send((task, result));
            }
        }
    }
    let _ = queues.finished_tx.send(());
}
