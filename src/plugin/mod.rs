//! The plugin contract and the process-wide plugin collection.

mod base;
mod collection;

pub use base::{Plugin, PluginKwargs, PluginType, Task};
pub use collection::PluginCollection;
