//! Message types for workflow tree construction and traversal events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Shape propagation ran to completion across the whole tree.
pub struct ShapesPropagated {
    pub node_count: usize,
}

impl Display for ShapesPropagated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "propagated result shapes across {} node(s)", self.node_count)
    }
}

impl StructuredLog for ShapesPropagated {
    fn log(&self) {
        tracing::info!(node_count = self.node_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shape_propagation", span_name = name, node_count = self.node_count)
    }
}

/// A single scan-point frame finished depth-first traversal of the tree.
pub struct FrameProcessed {
    pub frame_index: usize,
    pub nodes_executed: usize,
}

impl Display for FrameProcessed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "frame {} processed through {} node(s)",
            self.frame_index, self.nodes_executed
        )
    }
}

impl StructuredLog for FrameProcessed {
    fn log(&self) {
        tracing::debug!(frame_index = self.frame_index, nodes_executed = self.nodes_executed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("frame_processed", span_name = name, frame_index = self.frame_index)
    }
}
