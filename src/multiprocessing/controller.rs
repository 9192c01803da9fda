//! The cooperative controller loop that owns the worker pool.
//!
//! This is a direct translation of `worker_controller.py`'s `run()` method
//! and its `_flag_*` bookkeeping: a background thread owns the task queue
//! and the worker handles, and the public API (`start`, `suspend`, `stop`,
//! `add_task`, ...) just flips flags or pushes onto channels that the loop
//! polls. There is no live QThread to reach into from outside, so every
//! interaction crosses a channel or an atomic instead of a direct method
//! call on the running loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};

use crate::app::AppResult;
use crate::errors::{AppError, ExecutionError};
use crate::plugin::Task;

use super::queues::WorkerQueues;
use super::strategy::WorkerPoolStrategy;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const SUSPEND_TIMEOUT: Duration = Duration::from_secs(2);

/// The controller's coarse-grained lifecycle state, mirroring the
/// original's `_flag_running`/`_flag_active`/`_flag_thread_alive` trio
/// collapsed into one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Constructed, background thread alive, no run started yet.
    Idle,
    /// A run has been started and is actively processing tasks.
    Active,
    /// `suspend()` was called; the background thread is parked waiting
    /// for `start()`/`restart()` or `stop()`.
    Suspended,
    /// `finalize_tasks`/`stop` has been called; workers are draining.
    Draining,
    /// The background thread has exited; this controller cannot be
    /// restarted and must be discarded.
    Dead,
}

/// What callers observe happening, standing in for the original's Qt
/// signals (`sig_progress`, `sig_results`, `sig_finished`) and for the
/// "signal" queue in the five-queue design this crate carries forward as
/// an outward event bus rather than a literal fifth channel.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Fraction of queued tasks completed, in `[0.0, 1.0]`, or `-1.0` if no
    /// tasks have been queued yet.
    Progress(f64),
    /// One task's result, as it arrives from a worker.
    Results(Task, Result<AppResult, AppError>),
    /// Every worker has signalled `finished` and the run is complete.
    WorkersFinished,
}

/// Drives a pool of worker threads through a [`WorkerPoolStrategy`].
///
/// `AppRunner` (see [`super::AppRunner`]) is this type specialized over
/// [`super::AppPoolStrategy`] -- the generic parameter is the idiomatic
/// substitute for the original's subclassing of `WorkerController`.
pub struct WorkerController<S: WorkerPoolStrategy + 'static> {
    n_workers: usize,
    to_process: Arc<Mutex<VecDeque<Option<Task>>>>,
    stop_tx: Sender<()>,
    control_tx: Sender<ControlMessage>,
    event_rx: Receiver<ControllerEvent>,
    state: Arc<Mutex<ControllerState>>,
    progress_done: Arc<AtomicUsize>,
    progress_target: Arc<AtomicUsize>,
    thread_alive: Arc<AtomicBool>,
    controller_thread: Option<JoinHandle<()>>,
    _strategy: std::marker::PhantomData<S>,
}

enum ControlMessage {
    Start,
    Suspend,
    Stop,
}

impl<S: WorkerPoolStrategy + 'static> WorkerController<S> {
    /// Build a controller and immediately spawn its background thread, in
    /// the `Idle` state. No workers are started until [`Self::start`] is
    /// called.
    pub fn new(n_workers: usize, strategy: S) -> Self {
        let (input_tx, input_rx) = unbounded::<Option<Task>>();
        let (output_tx, output_rx) = unbounded();
        let (stop_tx, stop_rx) = unbounded::<()>();
        let (finished_tx, finished_rx) = unbounded::<()>();
        let (control_tx, control_rx) = unbounded::<ControlMessage>();
        let (event_tx, event_rx) = bounded::<ControllerEvent>(1024);

        let to_process = Arc::new(Mutex::new(VecDeque::new()));
        let state = Arc::new(Mutex::new(ControllerState::Idle));
        let progress_done = Arc::new(AtomicUsize::new(0));
        let progress_target = Arc::new(AtomicUsize::new(0));
        let thread_alive = Arc::new(AtomicBool::new(true));

        let loop_stop_tx = stop_tx.clone();
        let handle = {
            let to_process = to_process.clone();
            let state = state.clone();
            let progress_done = progress_done.clone();
            let progress_target = progress_target.clone();
            let thread_alive = thread_alive.clone();
            std::thread::spawn(move || {
                controller_loop(ControllerLoopArgs {
                    n_workers,
                    strategy,
                    input_tx,
                    input_rx,
                    output_tx,
                    output_rx,
                    stop_tx: loop_stop_tx,
                    stop_rx,
                    finished_tx,
                    finished_rx,
                    control_rx,
                    event_tx,
                    to_process,
                    state,
                    progress_done,
                    progress_target,
                    thread_alive,
                })
            })
        };

        Self {
            n_workers,
            to_process,
            stop_tx,
            control_tx,
            event_rx,
            state,
            progress_done,
            progress_target,
            thread_alive,
            controller_thread: Some(handle),
            _strategy: std::marker::PhantomData,
        }
    }

    pub fn state(&self) -> ControllerState {
        *self.state.lock().unwrap()
    }

    /// `done / target`, or `-1.0` if no tasks have been queued.
    pub fn progress(&self) -> f64 {
        let target = self.progress_target.load(Ordering::SeqCst);
        if target == 0 {
            return -1.0;
        }
        self.progress_done.load(Ordering::SeqCst) as f64 / target as f64
    }

    /// Drain the next available controller event, if any, without
    /// blocking.
    pub fn try_recv_event(&self) -> Option<ControllerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block until the next controller event arrives or `timeout` elapses.
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ControllerEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Begin (or resume, after [`Self::suspend`]) processing queued tasks.
    pub fn start(&self) -> Result<(), ExecutionError> {
        if *self.state.lock().unwrap() == ControllerState::Dead {
            return Err(ExecutionError::AlreadyRunning);
        }
        let _ = self.control_tx.send(ControlMessage::Start);
        Ok(())
    }

    /// Alias for [`Self::start`], matching the original's naming for
    /// resuming a suspended run.
    pub fn restart(&self) -> Result<(), ExecutionError> {
        self.start()
    }

    /// Ask the background thread not to start a new run once the current
    /// batch drains, without tearing down the workers processing it.
    /// Blocks briefly waiting for the background thread to acknowledge the
    /// transition out of `Active`.
    pub fn suspend(&self) {
        let _ = self.control_tx.send(ControlMessage::Suspend);
        let deadline = std::time::Instant::now() + SUSPEND_TIMEOUT;
        while *self.state.lock().unwrap() == ControllerState::Active {
            if std::time::Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Queue one task for processing.
    pub fn add_task(&self, task: Task) {
        self.to_process.lock().unwrap().push_back(Some(task));
        self.progress_target.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_tasks(&self, tasks: impl IntoIterator<Item = Task>) {
        for task in tasks {
            self.add_task(task);
        }
    }

    /// Queue one poison pill per worker, signalling that no more tasks
    /// will be added after those already queued.
    pub fn finalize_tasks(&self) {
        let mut queue = self.to_process.lock().unwrap();
        for _ in 0..self.n_workers {
            queue.push_back(None);
        }
    }

    /// Ask every worker to stop after its current task.
    pub fn send_stop_signal(&self) {
        for _ in 0..self.n_workers {
            let _ = self.stop_tx.send(());
        }
    }

    /// Suspend, queue poison pills, signal stop, and wait for the
    /// background thread to report the run complete. After this call the
    /// controller cannot be restarted.
    pub fn stop(&mut self) {
        self.suspend();
        self.finalize_tasks();
        self.send_stop_signal();
        let _ = self.control_tx.send(ControlMessage::Stop);
        if let Some(handle) = self.controller_thread.take() {
            let _ = handle.join();
        }
        self.thread_alive.store(false, Ordering::SeqCst);
        *self.state.lock().unwrap() = ControllerState::Dead;
    }
}

impl<S: WorkerPoolStrategy + 'static> Drop for WorkerController<S> {
    fn drop(&mut self) {
        if self.thread_alive.load(Ordering::SeqCst) {
            self.stop();
        }
    }
}

struct ControllerLoopArgs<S: WorkerPoolStrategy> {
    n_workers: usize,
    strategy: S,
    input_tx: Sender<Option<Task>>,
    input_rx: Receiver<Option<Task>>,
    output_tx: Sender<(Task, Result<AppResult, AppError>)>,
    output_rx: Receiver<(Task, Result<AppResult, AppError>)>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    finished_tx: Sender<()>,
    finished_rx: Receiver<()>,
    control_rx: Receiver<ControlMessage>,
    event_tx: Sender<ControllerEvent>,
    to_process: Arc<Mutex<VecDeque<Option<Task>>>>,
    state: Arc<Mutex<ControllerState>>,
    progress_done: Arc<AtomicUsize>,
    progress_target: Arc<AtomicUsize>,
    thread_alive: Arc<AtomicBool>,
}

/// The background thread body: translates `worker_controller.py`'s
/// `run()` -- wait to be started, spawn workers, pump the queues until
/// every worker reports `finished`, then go back to waiting (or exit on
/// `Stop`).
fn controller_loop<S: WorkerPoolStrategy>(mut args: ControllerLoopArgs<S>) {
    loop {
        match args.control_rx.recv() {
            Ok(ControlMessage::Start) => {}
            Ok(ControlMessage::Suspend) => continue,
            Ok(ControlMessage::Stop) | Err(_) => break,
        }
        *args.state.lock().unwrap() = ControllerState::Active;

        let tasks = match args.strategy.pre_run() {
            Ok(tasks) => tasks,
            Err(err) => {
                let _ = args
                    .event_tx
                    .send(ControllerEvent::Results(Task::Taskless, Err(err)));
                *args.state.lock().unwrap() = ControllerState::Dead;
                break;
            }
        };
        if !tasks.is_empty() {
            let mut queue = args.to_process.lock().unwrap();
            args.progress_target
                .fetch_add(tasks.len(), Ordering::SeqCst);
            for task in tasks {
                queue.push_back(Some(task));
            }
        }

        let workers: Vec<JoinHandle<()>> = (0..args.n_workers)
            .map(|_| {
                let queues = WorkerQueues {
                    input_rx: args.input_rx.clone(),
                    output_tx: args.output_tx.clone(),
                    stop_rx: args.stop_rx.clone(),
                    finished_tx: args.finished_tx.clone(),
                };
                args.strategy.spawn_worker(queues)
            })
            .collect();

        let mut finished_count = 0usize;
        loop {
            // Feed queued tasks into the shared input channel.
            while let Some(next) = args.to_process.lock().unwrap().pop_front() {
                let _ = args.input_tx.send(next);
            }

            match args.output_rx.recv_timeout(POLL_INTERVAL) {
                Ok((task, result)) => {
                    args.progress_done.fetch_add(1, Ordering::SeqCst);
                    let _ = args.event_tx.send(ControllerEvent::Results(task, result));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            while args.finished_rx.try_recv().is_ok() {
                finished_count += 1;
            }
            if finished_count >= args.n_workers {
                break;
            }

            if let Ok(ControlMessage::Stop) = args.control_rx.try_recv() {
                for _ in 0..args.n_workers {
                    let _ = args.stop_tx.send(());
                }
            }
        }

        for worker in workers {
            let _ = worker.join();
        }
        args.strategy.post_run();
        let _ = args.event_tx.send(ControllerEvent::WorkersFinished);
        *args.state.lock().unwrap() = ControllerState::Draining;

        if !args.thread_alive.load(Ordering::SeqCst) {
            break;
        }
    }
    *args.state.lock().unwrap() = ControllerState::Dead;
}
