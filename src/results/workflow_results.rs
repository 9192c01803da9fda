//! [`WorkflowResults`]: the dense, per-node composite result store a
//! `WorkflowTree` is executed into, one scan's worth of frames at a time.

use std::collections::HashMap;

use crate::context::ScanContext;
use crate::dataset::{AxisRange, Dataset};
use crate::errors::ResultsError;
use crate::observability::messages::results::ResultShapesUpdated;
use crate::observability::messages::StructuredLog;
use crate::workflow::{result_title, WorkflowTree};

/// Per-node axis labels/units/ranges, detached from a particular
/// [`Dataset`] so they can be handed back without borrowing the composite.
#[derive(Debug, Clone, Default)]
pub struct ResultMetadata {
    pub axis_labels: HashMap<usize, String>,
    pub axis_units: HashMap<usize, String>,
    pub axis_ranges: HashMap<usize, AxisRange>,
}

/// The assembled results of running a [`WorkflowTree`] over a
/// [`ScanContext`]: one composite [`Dataset`] per node that keeps results,
/// shaped `scan_shape ++ node_result_shape`.
///
/// Results are written in incrementally via [`Self::store_results`] as each
/// scan-point frame finishes traversal; nothing here assumes frames arrive
/// in order, since the worker pool in [`crate::multiprocessing`] completes
/// them out of order.
pub struct WorkflowResults {
    scan_shape: Vec<usize>,
    composites: HashMap<usize, Dataset>,
    shapes: HashMap<usize, Vec<usize>>,
    ndims: HashMap<usize, usize>,
    node_labels: HashMap<usize, String>,
    data_labels: HashMap<usize, String>,
    plugin_names: HashMap<usize, String>,
    result_titles: HashMap<usize, String>,
    source_hash: u64,
    metadata_complete: bool,
}

impl WorkflowResults {
    pub fn new() -> Self {
        Self {
            scan_shape: Vec::new(),
            composites: HashMap::new(),
            shapes: HashMap::new(),
            ndims: HashMap::new(),
            node_labels: HashMap::new(),
            data_labels: HashMap::new(),
            plugin_names: HashMap::new(),
            result_titles: HashMap::new(),
            source_hash: 0,
            metadata_complete: false,
        }
    }

    /// (Re)allocate a composite buffer per node that keeps results and has
    /// a fully-resolved shape (no `-1` entries). Nodes whose shape is not
    /// yet resolved are skipped; call
    /// [`crate::workflow::WorkflowTree::propagate_shapes_and_global_config`]
    /// first.
    pub fn update_shapes_from_scan_and_workflow(
        &mut self,
        scan: &ScanContext,
        tree: &WorkflowTree,
    ) -> Result<(), ResultsError> {
        self.scan_shape = scan.shape();
        self.composites.clear();
        self.shapes.clear();
        self.ndims.clear();
        self.node_labels.clear();
        self.data_labels.clear();
        self.plugin_names.clear();
        self.result_titles.clear();

        let mut total_elements = 0usize;
        for node in tree.nodes() {
            if !node.keep_results {
                continue;
            }
            let Some(result_shape) = &node.result_shape else {
                continue;
            };
            if result_shape.iter().any(|&d| d < 0) {
                continue;
            }
            let node_shape: Vec<usize> = result_shape.iter().map(|&d| d as usize).collect();
            let mut composite_shape = self.scan_shape.clone();
            composite_shape.extend_from_slice(&node_shape);

            let composite = Dataset::zeros(composite_shape.clone());
            total_elements += composite.len();
            self.ndims.insert(node.node_id, composite.ndim());
            self.shapes.insert(node.node_id, composite_shape);
            self.composites.insert(node.node_id, composite);
            self.node_labels
                .insert(node.node_id, node.plugin.plugin_name().to_string());
            self.plugin_names
                .insert(node.node_id, node.plugin.plugin_name().to_string());
            self.data_labels
                .insert(node.node_id, node.plugin.plugin_name().to_string());
            self.result_titles.insert(
                node.node_id,
                result_title(node.plugin.plugin_name(), node.node_id),
            );
        }
        self.source_hash = tree.hash();
        self.metadata_complete = !self.shapes.is_empty();
        ResultShapesUpdated {
            node_count: self.shapes.len(),
            total_elements,
        }
        .log();
        Ok(())
    }

    pub fn metadata_complete(&self) -> bool {
        self.metadata_complete
    }

    pub fn source_hash(&self) -> u64 {
        self.source_hash
    }

    pub fn shapes(&self) -> &HashMap<usize, Vec<usize>> {
        &self.shapes
    }

    pub fn ndims(&self) -> &HashMap<usize, usize> {
        &self.ndims
    }

    pub fn node_labels(&self) -> &HashMap<usize, String> {
        &self.node_labels
    }

    pub fn data_labels(&self) -> &HashMap<usize, String> {
        &self.data_labels
    }

    pub fn plugin_names(&self) -> &HashMap<usize, String> {
        &self.plugin_names
    }

    pub fn result_titles(&self) -> &HashMap<usize, String> {
        &self.result_titles
    }

    /// Write one frame's per-node results into their composite buffers at
    /// the scan position `frame_index` unravels to.
    pub fn store_results(
        &mut self,
        scan: &ScanContext,
        frame_index: usize,
        results: HashMap<usize, Dataset>,
    ) -> Result<(), ResultsError> {
        if !self.metadata_complete {
            return Err(ResultsError::MetadataIncomplete);
        }
        let position = scan
            .get_frame_position_in_scan(frame_index)
            .map_err(|e| ResultsError::Io(e.to_string()))?;
        for (node_id, data) in results {
            let Some(composite) = self.composites.get_mut(&node_id) else {
                continue;
            };
            write_at_scan_position(composite, &position, &data)?;
        }
        Ok(())
    }

    pub fn get_results(&self, node_id: usize) -> Result<&Dataset, ResultsError> {
        self.composites
            .get(&node_id)
            .ok_or(ResultsError::NoResultsForNode(node_id))
    }

    /// The node's composite with the leading scan dimensions collapsed
    /// into one flat axis.
    pub fn get_results_for_flattened_scan(&self, node_id: usize) -> Result<Dataset, ResultsError> {
        let composite = self.get_results(node_id)?;
        if self.scan_shape.len() <= 1 {
            return Ok(composite.clone());
        }
        Ok(composite.flatten_leading_axes(self.scan_shape.len())?)
    }

    /// A sub-range of one node's composite. `slices` is one `(axis, start,
    /// end)` triple per axis to restrict (axes not mentioned are kept in
    /// full); `flattened_scan_dim` addresses axes against the
    /// flattened-scan-dimension view rather than the full composite;
    /// `squeeze` drops any resulting axis of length 1.
    pub fn get_result_subset(
        &self,
        node_id: usize,
        slices: &[(usize, usize, usize)],
        flattened_scan_dim: bool,
        squeeze: bool,
    ) -> Result<Dataset, ResultsError> {
        let mut result = if flattened_scan_dim {
            self.get_results_for_flattened_scan(node_id)?
        } else {
            self.get_results(node_id)?.clone()
        };
        for &(axis, start, end) in slices {
            result = result.slice_range(axis, start, end)?;
        }
        if squeeze {
            let singleton_axes: Vec<usize> = result
                .shape()
                .iter()
                .enumerate()
                .filter(|&(_, &len)| len == 1)
                .map(|(axis, _)| axis)
                .collect();
            for axis in singleton_axes.into_iter().rev() {
                result = result.slice_index(axis, 0)?;
            }
        }
        Ok(result)
    }

    pub fn get_result_ranges(&self, node_id: usize) -> Result<Vec<AxisRange>, ResultsError> {
        let composite = self.get_results(node_id)?;
        Ok((0..composite.ndim())
            .map(|axis| composite.axis_range(axis).cloned().unwrap_or(AxisRange::Index))
            .collect())
    }

    pub fn get_result_metadata(&self, node_id: usize) -> Result<ResultMetadata, ResultsError> {
        let composite = self.get_results(node_id)?;
        let mut metadata = ResultMetadata::default();
        for axis in 0..composite.ndim() {
            if let Some(label) = composite.axis_label(axis) {
                metadata.axis_labels.insert(axis, label.to_string());
            }
            if let Some(unit) = composite.axis_unit(axis) {
                metadata.axis_units.insert(axis, unit.to_string());
            }
            if let Some(range) = composite.axis_range(axis) {
                metadata.axis_ranges.insert(axis, range.clone());
            }
        }
        Ok(metadata)
    }

    pub fn composites(&self) -> &HashMap<usize, Dataset> {
        &self.composites
    }

    /// Rebuild a `WorkflowResults` from previously-saved per-node
    /// composites, as read back by [`crate::results::io::NumpyLikeFormat`].
    /// Not for constructing results from a live run -- use
    /// [`Self::update_shapes_from_scan_and_workflow`] and
    /// [`Self::store_results`] for that.
    pub(crate) fn from_saved_nodes(
        source_hash: u64,
        nodes: Vec<(usize, String, String, Dataset)>,
    ) -> Self {
        let mut results = Self::new();
        results.source_hash = source_hash;
        for (node_id, plugin_name, title, dataset) in nodes {
            results.shapes.insert(node_id, dataset.shape().to_vec());
            results.ndims.insert(node_id, dataset.ndim());
            results.node_labels.insert(node_id, plugin_name.clone());
            results.plugin_names.insert(node_id, plugin_name.clone());
            results.data_labels.insert(node_id, plugin_name);
            results.result_titles.insert(node_id, title);
            results.composites.insert(node_id, dataset);
        }
        results.metadata_complete = !results.shapes.is_empty();
        results
    }
}

impl Default for WorkflowResults {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy `data` (shaped like one node's plugin output) into `composite` at
/// the given leading scan position, leaving the trailing plugin-shape axes
/// untouched.
fn write_at_scan_position(
    composite: &mut Dataset,
    position: &[usize],
    data: &Dataset,
) -> Result<(), ResultsError> {
    let n_scan_dims = position.len();
    let trailing_shape = &composite.shape()[n_scan_dims..];
    if trailing_shape != data.shape() {
        return Err(ResultsError::Dataset(
            crate::errors::DatasetError::ShapeMismatch {
                expected: trailing_shape.to_vec(),
                actual: data.shape().to_vec(),
            },
        ));
    }
    let trailing_len: usize = trailing_shape.iter().product();
    let mut index = position.to_vec();
    if trailing_len == 0 {
        return Ok(());
    }
    for flat in 0..trailing_len {
        let mut rem = flat;
        let mut trailing_index = vec![0usize; trailing_shape.len()];
        for (axis, &dim) in trailing_shape.iter().enumerate().rev() {
            trailing_index[axis] = rem % dim;
            rem /= dim;
        }
        index.truncate(n_scan_dims);
        index.extend_from_slice(&trailing_index);
        composite.set(&index, data.get(&trailing_index)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, PluginKwargs, PluginType, Task};
    use crate::parameter::ParameterCollection;

    struct StubPlugin {
        params: ParameterCollection,
    }

    impl Plugin for StubPlugin {
        fn plugin_name(&self) -> &str {
            "StubPlugin"
        }
        fn plugin_type(&self) -> PluginType {
            PluginType::Proc
        }
        fn default_params(&self) -> ParameterCollection {
            ParameterCollection::new()
        }
        fn params(&self) -> &ParameterCollection {
            &self.params
        }
        fn params_mut(&mut self) -> &mut ParameterCollection {
            &mut self.params
        }
        fn input_data_dim(&self) -> Option<usize> {
            Some(2)
        }
        fn output_data_dim(&self) -> Option<usize> {
            Some(1)
        }
        fn pre_execute(&mut self) -> Result<(), crate::errors::PluginError> {
            Ok(())
        }
        fn execute(
            &mut self,
            _task: Task,
            input: Option<Dataset>,
            kwargs: PluginKwargs,
        ) -> Result<(Dataset, PluginKwargs), crate::errors::PluginError> {
            Ok((input.unwrap(), kwargs))
        }
        fn calculate_result_shape(&mut self) -> Result<Vec<isize>, crate::errors::PluginError> {
            Ok(vec![4])
        }
        fn set_input_shape(&mut self, _shape: Vec<isize>) {}
        fn clone_plugin(&self) -> Box<dyn Plugin> {
            Box::new(StubPlugin {
                params: self.params.clone(),
            })
        }
    }

    fn scan_2x3() -> ScanContext {
        let mut scan = ScanContext::new();
        scan.add_dimension("y", "mm", 2, 1.0, 0.0);
        scan.add_dimension("x", "mm", 3, 1.0, 0.0);
        scan
    }

    fn tree_with_one_node() -> WorkflowTree {
        let mut tree = WorkflowTree::new();
        let id = tree
            .create_and_add_node(
                Box::new(StubPlugin {
                    params: ParameterCollection::new(),
                }),
                None,
            )
            .unwrap();
        tree.node_mut(id).unwrap().result_shape = Some(vec![4]);
        tree.node_mut(id).unwrap().keep_results = true;
        tree
    }

    #[test]
    fn allocates_composite_shaped_scan_plus_plugin() {
        let scan = scan_2x3();
        let tree = tree_with_one_node();
        let mut results = WorkflowResults::new();
        results.update_shapes_from_scan_and_workflow(&scan, &tree).unwrap();

        assert!(results.metadata_complete());
        let node_id = tree.root().unwrap();
        assert_eq!(results.shapes()[&node_id], vec![2, 3, 4]);
    }

    #[test]
    fn store_results_writes_to_the_right_scan_position() {
        let scan = scan_2x3();
        let tree = tree_with_one_node();
        let node_id = tree.root().unwrap();
        let mut results = WorkflowResults::new();
        results.update_shapes_from_scan_and_workflow(&scan, &tree).unwrap();

        let mut frame_result = HashMap::new();
        frame_result.insert(node_id, Dataset::new(vec![1.0, 2.0, 3.0, 4.0], vec![4]).unwrap());
        // frame 4 -> scan position (1, 1) under row-major unravelling
        results.store_results(&scan, 4, frame_result).unwrap();

        let composite = results.get_results(node_id).unwrap();
        assert_eq!(composite.get(&[1, 1, 0]).unwrap(), 1.0);
        assert_eq!(composite.get(&[1, 1, 3]).unwrap(), 4.0);
        assert_eq!(composite.get(&[0, 0, 0]).unwrap(), 0.0);
    }

    #[test]
    fn store_before_metadata_complete_is_rejected() {
        let scan = scan_2x3();
        let mut results = WorkflowResults::new();
        let err = results.store_results(&scan, 0, HashMap::new()).unwrap_err();
        assert!(matches!(err, ResultsError::MetadataIncomplete));
    }

    #[test]
    fn flattened_scan_view_merges_leading_axes() {
        let scan = scan_2x3();
        let tree = tree_with_one_node();
        let node_id = tree.root().unwrap();
        let mut results = WorkflowResults::new();
        results.update_shapes_from_scan_and_workflow(&scan, &tree).unwrap();

        let flat = results.get_results_for_flattened_scan(node_id).unwrap();
        assert_eq!(flat.shape(), &[6, 4]);
    }
}
