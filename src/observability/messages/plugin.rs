//! Message types for plugin discovery and shape propagation events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A plugin was registered in the collection.
pub struct PluginRegistered<'a> {
    pub name: &'a str,
    pub plugin_type: &'a str,
}

impl Display for PluginRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "registered {} plugin '{}'", self.plugin_type, self.name)
    }
}

impl StructuredLog for PluginRegistered<'_> {
    fn log(&self) {
        tracing::info!(name = self.name, plugin_type = self.plugin_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("plugin_registered", span_name = name, plugin = self.name)
    }
}

/// A directory was scanned for plugin registration manifests.
pub struct PluginDirectoryScanned<'a> {
    pub path: &'a str,
    pub found: usize,
}

impl Display for PluginDirectoryScanned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "scanned '{}': found {} plugin(s)", self.path, self.found)
    }
}

impl StructuredLog for PluginDirectoryScanned<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, found = self.found, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("plugin_discovery", span_name = name, path = self.path)
    }
}
