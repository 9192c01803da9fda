//! The [`BaseApp`] contract: a parameterized unit of work with a fixed
//! multiprocessing lifecycle.

use std::collections::HashMap;

use crate::dataset::Dataset;
use crate::errors::AppError;
use crate::parameter::ParameterCollection;
use crate::plugin::Task;

/// A loosely-typed configuration bag, analogous to the original's
/// `app._config` dictionary: values that aren't parameters (internal
/// bookkeeping state) but still need to travel with the app across a
/// `copy()`.
pub type AppConfig = HashMap<String, serde_yaml::Value>;

/// What one call to [`BaseApp::multiprocessing_func`] produces: a result
/// per workflow-tree node, keyed by node id.
pub type AppResult = HashMap<usize, Dataset>;

/// The fixed lifecycle every multiprocessing-driven application follows.
///
/// Every method here is called by the worker loop in
/// [`crate::multiprocessing::processor`], never by application code
/// directly -- the sequence is always `multiprocessing_pre_run` once,
/// then for each task: `multiprocessing_pre_cycle`,
/// `multiprocessing_carryon`, and if that returned `true`,
/// `multiprocessing_func` followed by `multiprocessing_store_results` on
/// the controller side, finishing with one `multiprocessing_post_run`.
pub trait BaseApp: Send {
    fn params(&self) -> &ParameterCollection;

    fn params_mut(&mut self) -> &mut ParameterCollection;

    fn config(&self) -> &AppConfig;

    fn config_mut(&mut self) -> &mut AppConfig;

    /// One-time setup before any tasks are processed.
    fn multiprocessing_pre_run(&mut self) -> Result<(), AppError>;

    /// The full list of tasks this run will process. An empty vec is valid
    /// for tasks-less apps, which instead decide what to do per cycle in
    /// [`Self::multiprocessing_pre_cycle`]/[`Self::multiprocessing_carryon`].
    fn multiprocessing_get_tasks(&self) -> Vec<Task>;

    /// Called once per task before `multiprocessing_carryon` is checked,
    /// giving the app a chance to update its internal state for this task.
    fn multiprocessing_pre_cycle(&mut self, task: Task);

    /// Whether to actually run `multiprocessing_func` for the task just
    /// passed to `multiprocessing_pre_cycle`. Apps that always want to
    /// proceed simply return `true`.
    fn multiprocessing_carryon(&self) -> bool;

    /// Do the actual work for one task.
    fn multiprocessing_func(&mut self, task: Task) -> Result<AppResult, AppError>;

    /// Receive a task's result on the controller side (as opposed to
    /// inside the worker that produced it).
    fn multiprocessing_store_results(&mut self, task: Task, result: AppResult);

    /// One-time teardown after every task has been processed.
    fn multiprocessing_post_run(&mut self);

    /// A clone of this app. `clone_mode` mirrors the original's
    /// `slave_mode` flag: when `true`, the copy is understood to run
    /// inside a worker and should not carry over state only meaningful on
    /// the controller side (accumulated results, UI hooks).
    fn copy(&self, clone_mode: bool) -> Box<dyn BaseApp>;
}
