//! The [`Plugin`] trait every workflow-tree node wraps.

use std::collections::HashMap;

use crate::dataset::Dataset;
use crate::errors::PluginError;
use crate::parameter::{ParamValue, ParameterCollection};

/// What a single unit of work through the tree is keyed by.
///
/// `Frame` drives the common case: one raw detector frame, identified by
/// its flat index into the scan. `Taskless` is for apps whose workers
/// decide what to compute on the fly rather than being handed an index
/// (mirrored from the tasks-less processor variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Frame(usize),
    Taskless,
}

/// Side-channel values threaded alongside a [`Dataset`] through a workflow
/// tree's execution -- e.g. a `global_index` the root input plugin
/// attaches, or a flag a downstream plugin sets for one further
/// downstream.
pub type PluginKwargs = HashMap<String, ParamValue>;

/// The three roles a plugin can play in a [`crate::workflow::WorkflowTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    Input,
    Proc,
    Output,
}

/// The contract every pipeline step implements.
///
/// A plugin is parameterized by a [`ParameterCollection`], declares its
/// expected input/output dimensionality, and is cloneable so a
/// [`crate::plugin::PluginCollection`] can hand out a fresh instance per
/// tree node without shared mutable state between nodes.
pub trait Plugin: Send {
    fn plugin_name(&self) -> &str;

    fn plugin_type(&self) -> PluginType;

    fn default_params(&self) -> ParameterCollection;

    fn params(&self) -> &ParameterCollection;

    fn params_mut(&mut self) -> &mut ParameterCollection;

    /// The number of dimensions this plugin expects on its input, or
    /// `None` for input plugins which have no upstream data.
    fn input_data_dim(&self) -> Option<usize>;

    /// The number of dimensions this plugin's output will have, once
    /// known; `None` before [`Self::calculate_result_shape`] has run.
    fn output_data_dim(&self) -> Option<usize>;

    /// Perform any one-time setup needed before repeated [`Self::execute`]
    /// calls (opening files, allocating buffers). Called once per scan,
    /// not once per frame.
    fn pre_execute(&mut self) -> Result<(), PluginError>;

    /// Process one task. `input` is the upstream node's result dataset, or
    /// `None` for an input plugin at the root of the tree (which produces
    /// data rather than consuming it). Returns the result dataset and the
    /// (possibly updated) kwargs to pass downstream.
    fn execute(
        &mut self,
        task: Task,
        input: Option<Dataset>,
        kwargs: PluginKwargs,
    ) -> Result<(Dataset, PluginKwargs), PluginError>;

    /// Determine this plugin's output shape from its (already-set) input
    /// shape. `-1` entries mean "not yet determined" (e.g. dependent on
    /// runtime data), matching the original's convention for deferred
    /// shape components.
    fn calculate_result_shape(&mut self) -> Result<Vec<isize>, PluginError>;

    /// Record the shape of the data this plugin will receive, supplied by
    /// the tree during shape propagation.
    fn set_input_shape(&mut self, shape: Vec<isize>);

    /// A fresh, independent copy of this plugin (including its current
    /// parameter values, not just its defaults).
    fn clone_plugin(&self) -> Box<dyn Plugin>;

    /// The source filename for a given scan index, for input plugins that
    /// read from a file series. `None` for plugins with no file backing.
    fn get_filename(&self, _index: usize) -> Option<std::path::PathBuf> {
        None
    }
}
