//! Message types for result storage and persistence events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Composite result buffers were (re)allocated for a tree/scan combination.
pub struct ResultShapesUpdated {
    pub node_count: usize,
    pub total_elements: usize,
}

impl Display for ResultShapesUpdated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "allocated result storage for {} node(s), {} element(s) total",
            self.node_count, self.total_elements
        )
    }
}

impl StructuredLog for ResultShapesUpdated {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            total_elements = self.total_elements,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("result_shapes_updated", span_name = name, node_count = self.node_count)
    }
}

/// Results were written to disk.
pub struct ResultsSaved {
    pub directory: String,
    pub node_count: usize,
}

impl Display for ResultsSaved {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "saved {} node result(s) to {}", self.node_count, self.directory)
    }
}

impl StructuredLog for ResultsSaved {
    fn log(&self) {
        tracing::info!(directory = %self.directory, node_count = self.node_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("results_saved", span_name = name, directory = %self.directory)
    }
}
