//! Error types for the pydidas execution substrate.
//!
//! Each subsystem gets its own error enum rather than one crate-wide error,
//! so a caller matching on a `ParameterError` never has to think about
//! variants that could only come from the multiprocessing layer.

use thiserror::Error;

/// Errors raised while constructing or mutating a [`crate::parameter::Parameter`]
/// or [`crate::parameter::ParameterCollection`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("value {value} is not valid for parameter '{refkey}' of type {expected_type}")]
    TypeMismatch {
        refkey: String,
        value: String,
        expected_type: String,
    },

    #[error("value {value} is not among the allowed choices for parameter '{refkey}': {choices:?}")]
    NotAChoice {
        refkey: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("parameter '{0}' is not optional and cannot be set to None")]
    NotOptional(String),

    #[error("a parameter with refkey '{0}' already exists in this collection")]
    DuplicateKey(String),

    #[error("no parameter with refkey '{0}' in this collection")]
    UnknownKey(String),

    #[error("cannot merge collections: refkey '{0}' exists in both with different types")]
    MergeConflict(String),
}

/// Errors raised by [`crate::dataset::Dataset`] operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("axis {axis} is out of bounds for a dataset with {ndim} dimensions")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    #[error("index {index:?} is out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("axis range for axis {axis} has length {range_len}, but the axis has length {axis_len}")]
    RangeLengthMismatch {
        axis: usize,
        range_len: usize,
        axis_len: usize,
    },
}

/// Errors raised by [`crate::context::ScanContext`] and
/// [`crate::context::DiffractionExperimentContext`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("frame index {frame_index} is out of range for a scan with {n_points} points")]
    FrameIndexOutOfRange { frame_index: usize, n_points: usize },

    #[error("scan has no defined dimensions")]
    EmptyScan,

    #[error("qsettings key '{0}' is not known")]
    UnknownSetting(String),
}

/// Errors raised by [`crate::plugin`] discovery and instantiation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("no plugin registered under the name '{0}'")]
    UnknownPlugin(String),

    #[error("a plugin is already registered under the name '{0}'")]
    DuplicatePlugin(String),

    #[error("plugin '{plugin}' failed during pre_execute: {reason}")]
    PreExecuteFailed { plugin: String, reason: String },

    #[error("plugin '{plugin}' failed during execute: {reason}")]
    ExecuteFailed { plugin: String, reason: String },

    #[error("plugin '{plugin}' could not determine its result shape: {reason}")]
    ShapeResolutionFailed { plugin: String, reason: String },

    #[error("path '{0}' could not be scanned for plugins: {1}")]
    DiscoveryIoError(String, String),
}

/// Errors raised by [`crate::workflow::WorkflowTree`] construction and traversal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("node {0} does not exist in this tree")]
    UnknownNode(usize),

    #[error("node {0} already has a parent and cannot be attached again")]
    AlreadyAttached(usize),

    #[error("a tree can have at most one root node, but one already exists")]
    RootAlreadySet,

    #[error("tree has no root node")]
    EmptyTree,

    #[error("failed to parse workflow tree text: {0}")]
    ParseError(String),

    #[error("node {node_id} has undefined input shape, call propagate_shapes_and_global_config first")]
    ShapeNotPropagated { node_id: usize },
}

/// Errors raised by [`crate::app::BaseApp`] implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("application task {task:?} failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("application is not configured: {0}")]
    NotConfigured(String),
}

/// Errors raised by the worker pool / controller in [`crate::multiprocessing`].
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("controller is already running and cannot be restarted without suspend()")]
    AlreadyRunning,

    #[error("timed out after {0:?} waiting for workers to finish")]
    Timeout(std::time::Duration),

    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),

    #[error("a queue endpoint was disconnected unexpectedly")]
    QueueDisconnected,
}

/// Errors raised by [`crate::results::WorkflowResults`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultsError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("node {0} has no stored results")]
    NoResultsForNode(usize),

    #[error("cannot write results before metadata is complete")]
    MetadataIncomplete,

    #[error("result I/O failed: {0}")]
    Io(String),
}

/// Errors raised by a [`crate::registry::FormatRegistry`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IoRegistryError {
    #[error("no handler registered for extension '{0}'")]
    UnknownExtension(String),

    #[error("extension '{extension}' is already claimed by handler '{existing_handler}'")]
    ExtensionCollision {
        extension: String,
        existing_handler: String,
    },

    #[error("handler '{handler}' does not support {direction} for this data shape")]
    UnsupportedOperation { handler: String, direction: String },
}
