//! The concrete app that drives a [`WorkflowTree`] across a [`ScanContext`].

use crate::context::ScanContext;
use crate::errors::AppError;
use crate::parameter::ParameterCollection;
use crate::plugin::Task;
use crate::workflow::WorkflowTree;

use super::base_app::{AppConfig, AppResult, BaseApp};

/// Runs every frame of a scan through a workflow tree. Tasks are frame
/// indices `0..scan.n_frames_required()`; each task's
/// [`BaseApp::multiprocessing_func`] call is one depth-first pass through
/// the tree for that frame.
pub struct WorkflowProcessingApp {
    tree: WorkflowTree,
    n_frames: usize,
    params: ParameterCollection,
    config: AppConfig,
}

impl WorkflowProcessingApp {
    pub fn new(scan: &ScanContext, mut tree: WorkflowTree) -> Result<Self, AppError> {
        tree.prepare_execution()?;
        tree.propagate_shapes_and_global_config()?;
        Ok(Self {
            tree,
            n_frames: scan.n_frames_required(),
            params: ParameterCollection::new(),
            config: AppConfig::new(),
        })
    }

    pub fn tree(&self) -> &WorkflowTree {
        &self.tree
    }
}

impl BaseApp for WorkflowProcessingApp {
    fn params(&self) -> &ParameterCollection {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParameterCollection {
        &mut self.params
    }

    fn config(&self) -> &AppConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    fn multiprocessing_pre_run(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    fn multiprocessing_get_tasks(&self) -> Vec<Task> {
        (0..self.n_frames).map(Task::Frame).collect()
    }

    fn multiprocessing_pre_cycle(&mut self, _task: Task) {}

    fn multiprocessing_carryon(&self) -> bool {
        true
    }

    fn multiprocessing_func(&mut self, task: Task) -> Result<AppResult, AppError> {
        let Task::Frame(frame_index) = task else {
            return Err(AppError::TaskFailed {
                task: format!("{task:?}"),
                reason: "WorkflowProcessingApp requires a Frame task".into(),
            });
        };
        self.tree
            .execute_process(frame_index, false)
            .map_err(AppError::from)
    }

    fn multiprocessing_store_results(&mut self, _task: Task, _result: AppResult) {
        // Aggregation happens in `crate::results::WorkflowResults`, which
        // owns the composite buffers; the app itself is stateless here.
    }

    fn multiprocessing_post_run(&mut self) {}

    fn copy(&self, _clone_mode: bool) -> Box<dyn BaseApp> {
        Box::new(Self {
            tree: self.tree.deep_clone(),
            n_frames: self.n_frames,
            params: self.params.copy(),
            config: self.config.clone(),
        })
    }
}
