//! A single node in a [`super::WorkflowTree`]: a plugin plus its position
//! in the tree.

use crate::dataset::Dataset;
use crate::plugin::{Plugin, PluginKwargs};

/// One plugin's place in the tree, along with whatever it produced on the
/// most recent frame it processed.
pub struct WorkflowNode {
    pub node_id: usize,
    pub plugin: Box<dyn Plugin>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub result_shape: Option<Vec<isize>>,
    pub results: Option<Dataset>,
    pub result_kws: Option<PluginKwargs>,
    pub keep_results: bool,
}

impl WorkflowNode {
    pub fn new(node_id: usize, plugin: Box<dyn Plugin>, parent: Option<usize>) -> Self {
        Self {
            node_id,
            plugin,
            parent,
            children: Vec::new(),
            result_shape: None,
            results: None,
            result_kws: None,
            keep_results: false,
        }
    }
}

/// A human-readable label for a node's results, `"{label} (node #{id:03})"`.
pub fn result_title(label: &str, node_id: usize) -> String {
    format!("{label} (node #{node_id:03})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_title_pads_node_id() {
        assert_eq!(result_title("Integrated intensity", 7), "Integrated intensity (node #007)");
    }
}
