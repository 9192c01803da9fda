//! The per-worker channel handles every processor loop needs.

use crossbeam_channel::{Receiver, Sender};

use crate::app::AppResult;
use crate::errors::AppError;
use crate::plugin::Task;

/// The four queues a single worker thread needs. `input_rx` and `stop_rx`
/// are shared receivers cloned from the controller's channels (crossbeam
/// channels are multi-consumer, so several workers pulling from the same
/// receiver compete for work the way several OS processes would compete
/// for items on a shared `multiprocessing.Queue`).
#[derive(Clone)]
pub struct WorkerQueues {
    pub input_rx: Receiver<Option<Task>>,
    pub output_tx: Sender<(Task, Result<AppResult, AppError>)>,
    pub stop_rx: Receiver<()>,
    pub finished_tx: Sender<()>,
}
