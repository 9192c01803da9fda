//! A minimal counting application used by multiprocessing tests -- it has
//! no plugins or scan geometry, just a task count and an optional forced
//! failure/delay, so the worker pool's own behaviour can be exercised
//! independently of the workflow tree.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::dataset::Dataset;
use crate::errors::AppError;
use crate::parameter::ParameterCollection;
use crate::plugin::Task;

use super::base_app::{AppConfig, AppResult, BaseApp};

/// A `BaseApp` that produces `n_tasks` single-value results, one per
/// `Task::Frame`. If `fail_on` is set, that task index returns an error
/// instead of a result. `delay` is slept before producing each result, to
/// exercise the controller's progress reporting under slow workers.
pub struct CountingMockApp {
    pub n_tasks: usize,
    pub fail_on: Option<usize>,
    pub delay: Duration,
    pub pre_run_called: Arc<AtomicUsize>,
    pub post_run_called: Arc<AtomicUsize>,
    params: ParameterCollection,
    config: AppConfig,
}

impl CountingMockApp {
    pub fn new(n_tasks: usize) -> Self {
        Self {
            n_tasks,
            fail_on: None,
            delay: Duration::from_millis(0),
            pre_run_called: Arc::new(AtomicUsize::new(0)),
            post_run_called: Arc::new(AtomicUsize::new(0)),
            params: ParameterCollection::new(),
            config: AppConfig::new(),
        }
    }
}

impl BaseApp for CountingMockApp {
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
        self.pre_run_called.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn multiprocessing_get_tasks(&self) -> Vec<Task> {
        (0..self.n_tasks).map(Task::Frame).collect()
    }

    fn multiprocessing_pre_cycle(&mut self, _task: Task) {}

    fn multiprocessing_carryon(&self) -> bool {
        true
    }

    fn multiprocessing_func(&mut self, task: Task) -> Result<AppResult, AppError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let Task::Frame(index) = task else {
            return Err(AppError::TaskFailed {
                task: format!("{task:?}"),
                reason: "CountingMockApp requires a Frame task".into(),
            });
        };
        if self.fail_on == Some(index) {
            return Err(AppError::TaskFailed {
                task: format!("{task:?}"),
                reason: "forced failure for testing".into(),
            });
        }
        let mut out = HashMap::new();
        out.insert(0, Dataset::new(vec![index as f64], vec![1]).unwrap());
        Ok(out)
    }

    fn multiprocessing_store_results(&mut self, _task: Task, _result: AppResult) {}

    fn multiprocessing_post_run(&mut self) {
        self.post_run_called.fetch_add(1, Ordering::SeqCst);
    }

    fn copy(&self, _clone_mode: bool) -> Box<dyn BaseApp> {
        Box::new(Self {
            n_tasks: self.n_tasks,
            fail_on: self.fail_on,
            delay: self.delay,
            pre_run_called: self.pre_run_called.clone(),
            post_run_called: self.post_run_called.clone(),
            params: self.params.copy(),
            config: self.config.clone(),
        })
    }
}
