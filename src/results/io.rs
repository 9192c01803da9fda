//! Disk persistence for [`super::WorkflowResults`].
//!
//! The real pydidas backends (`numpy_io.py`, `hdf5_io.py`) write binary
//! `.npy`/HDF5 files. Neither a numpy-compatible binary writer nor an HDF5
//! binding is part of this crate's dependency stack, so `NumpyLikeFormat`
//! writes the same `/entry/<node>/data` + axis-metadata layout as a JSON
//! sidecar per node plus a manifest -- the natural stand-in for a group
//! hierarchy when the storage format itself is out of scope, while keeping
//! the registry-handler contract ([`crate::registry::FormatHandler`]) that
//! every concrete backend in the original is expected to satisfy.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{AxisRange, Dataset};
use crate::errors::{DatasetError, ResultsError};
use crate::observability::messages::results::ResultsSaved;
use crate::observability::messages::StructuredLog;
use crate::registry::FormatHandler;

use super::workflow_results::WorkflowResults;

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Serialize, Deserialize)]
struct Manifest {
    source_hash: u64,
    nodes: Vec<ManifestEntry>,
}

#[derive(Serialize, Deserialize)]
struct ManifestEntry {
    node_id: usize,
    plugin_name: String,
    title: String,
    file: String,
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
    shape: Vec<usize>,
    data: Vec<f64>,
    axis_labels: HashMap<usize, String>,
    axis_units: HashMap<usize, String>,
    axis_ranges: HashMap<usize, AxisRange>,
}

/// A `FormatHandler` for the JSON-sidecar result representation described
/// above. Registered under the `.json` extension alongside any other
/// format handler a front end adds to the same [`crate::registry::FormatRegistry`].
pub struct NumpyLikeFormat;

impl FormatHandler for NumpyLikeFormat {
    fn format_name(&self) -> &str {
        "NumpyLike (JSON sidecar)"
    }

    fn extensions_import(&self) -> &[&str] {
        &["json"]
    }

    fn extensions_export(&self) -> &[&str] {
        &["json"]
    }

    fn dimensions(&self) -> &[usize] {
        &[1, 2, 3, 4, 5, 6]
    }
}

impl NumpyLikeFormat {
    /// Create `directory` (and any missing parents) so
    /// [`Self::save_results_to_disk`] has somewhere to write.
    pub fn prepare_files_for_saving(&self, directory: &Path) -> Result<(), ResultsError> {
        fs::create_dir_all(directory).map_err(|e| ResultsError::Io(e.to_string()))
    }

    /// Write every composite result plus a manifest into `directory`.
    pub fn save_results_to_disk(
        &self,
        results: &WorkflowResults,
        directory: &Path,
    ) -> Result<(), ResultsError> {
        if !results.metadata_complete() {
            return Err(ResultsError::MetadataIncomplete);
        }
        self.prepare_files_for_saving(directory)?;

        let mut node_ids: Vec<&usize> = results.composites().keys().collect();
        node_ids.sort();
        let mut entries = Vec::with_capacity(node_ids.len());
        for &node_id in &node_ids {
            let dataset = &results.composites()[node_id];
            let file_name = format!("node_{node_id:03}.json");
            let record = NodeRecord {
                shape: dataset.shape().to_vec(),
                data: dataset.as_slice().to_vec(),
                axis_labels: (0..dataset.ndim())
                    .filter_map(|a| dataset.axis_label(a).map(|l| (a, l.to_string())))
                    .collect(),
                axis_units: (0..dataset.ndim())
                    .filter_map(|a| dataset.axis_unit(a).map(|u| (a, u.to_string())))
                    .collect(),
                axis_ranges: (0..dataset.ndim())
                    .filter_map(|a| dataset.axis_range(a).map(|r| (a, r.clone())))
                    .collect(),
            };
            let text = serde_json::to_string_pretty(&record)
                .map_err(|e| ResultsError::Io(e.to_string()))?;
            fs::write(directory.join(&file_name), text)
                .map_err(|e| ResultsError::Io(e.to_string()))?;
            entries.push(ManifestEntry {
                node_id: *node_id,
                plugin_name: results.plugin_names()[node_id].clone(),
                title: results.result_titles()[node_id].clone(),
                file: file_name,
            });
        }
        let manifest = Manifest {
            source_hash: results.source_hash(),
            nodes: entries,
        };
        let manifest_text =
            serde_json::to_string_pretty(&manifest).map_err(|e| ResultsError::Io(e.to_string()))?;
        fs::write(directory.join(MANIFEST_FILE), manifest_text)
            .map_err(|e| ResultsError::Io(e.to_string()))?;

        ResultsSaved {
            directory: directory.display().to_string(),
            node_count: node_ids.len(),
        }
        .log();
        Ok(())
    }

    /// Read back a [`WorkflowResults`] previously written by
    /// [`Self::save_results_to_disk`].
    pub fn import_data_from_directory(&self, directory: &Path) -> Result<WorkflowResults, ResultsError> {
        let manifest_text = fs::read_to_string(directory.join(MANIFEST_FILE))
            .map_err(|e| ResultsError::Io(e.to_string()))?;
        let manifest: Manifest =
            serde_json::from_str(&manifest_text).map_err(|e| ResultsError::Io(e.to_string()))?;

        let mut nodes = Vec::with_capacity(manifest.nodes.len());
        for entry in manifest.nodes {
            let text = fs::read_to_string(directory.join(&entry.file))
                .map_err(|e| ResultsError::Io(e.to_string()))?;
            let record: NodeRecord =
                serde_json::from_str(&text).map_err(|e| ResultsError::Io(e.to_string()))?;
            let expected: usize = record.shape.iter().product();
            if record.data.len() != expected {
                return Err(ResultsError::Dataset(DatasetError::ShapeMismatch {
                    expected: record.shape.clone(),
                    actual: vec![record.data.len()],
                }));
            }
            let mut dataset = Dataset::new(record.data, record.shape)?;
            for (axis, label) in record.axis_labels {
                dataset.set_axis_label(axis, label);
            }
            for (axis, unit) in record.axis_units {
                dataset.set_axis_unit(axis, unit);
            }
            for (axis, range) in record.axis_ranges {
                let _ = dataset.set_axis_range(axis, range);
            }
            nodes.push((entry.node_id, entry.plugin_name, entry.title, dataset));
        }
        Ok(WorkflowResults::from_saved_nodes(manifest.source_hash, nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScanContext;
    use crate::workflow::WorkflowTree;

    fn sample_results() -> WorkflowResults {
        use crate::parameter::ParameterCollection;
        use crate::plugin::{Plugin, PluginKwargs, PluginType, Task};

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
                Some(1)
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
                Ok(vec![2])
            }
            fn set_input_shape(&mut self, _shape: Vec<isize>) {}
            fn clone_plugin(&self) -> Box<dyn Plugin> {
                Box::new(StubPlugin {
                    params: self.params.clone(),
                })
            }
        }

        let mut scan = ScanContext::new();
        scan.add_dimension("y", "mm", 2, 1.0, 0.0);
        let mut tree = WorkflowTree::new();
        let id = tree
            .create_and_add_node(
                Box::new(StubPlugin {
                    params: ParameterCollection::new(),
                }),
                None,
            )
            .unwrap();
        tree.node_mut(id).unwrap().result_shape = Some(vec![2]);
        tree.node_mut(id).unwrap().keep_results = true;

        let mut results = WorkflowResults::new();
        results.update_shapes_from_scan_and_workflow(&scan, &tree).unwrap();
        results
    }

    #[test]
    fn round_trips_through_disk() {
        let results = sample_results();
        let dir = tempfile::tempdir().unwrap();
        let format = NumpyLikeFormat;

        format.save_results_to_disk(&results, dir.path()).unwrap();
        let reloaded = format.import_data_from_directory(dir.path()).unwrap();

        assert_eq!(reloaded.source_hash(), results.source_hash());
        for (node_id, shape) in results.shapes() {
            assert_eq!(&reloaded.shapes()[node_id], shape);
        }
    }

    #[test]
    fn saving_with_incomplete_metadata_is_rejected() {
        let results = WorkflowResults::new();
        let dir = tempfile::tempdir().unwrap();
        let err = NumpyLikeFormat
            .save_results_to_disk(&results, dir.path())
            .unwrap_err();
        assert!(matches!(err, ResultsError::MetadataIncomplete));
    }
}
