//! Depth-first text (de)serialization of a [`super::WorkflowTree`].
//!
//! Each node becomes a `{node_id, parent_id, plugin_class_fqname, params}`
//! record; the params map is carried through `serde_yaml::Value`, the same
//! loosely-typed container the multiprocessing config layer uses for its
//! own option bags.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::WorkflowError;
use crate::parameter::ParamValue;
use crate::plugin::Plugin;

use super::tree::WorkflowTree;

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    node_id: usize,
    parent_id: Option<usize>,
    plugin_class_fqname: String,
    params: HashMap<String, String>,
}

pub fn export(tree: &WorkflowTree) -> Result<String, WorkflowError> {
    let mut records = Vec::new();
    for node in tree.nodes() {
        let params = node
            .plugin
            .params()
            .iter()
            .map(|p| (p.refkey().to_string(), p.value().to_string()))
            .collect();
        records.push(NodeRecord {
            node_id: node.node_id,
            parent_id: node.parent,
            plugin_class_fqname: node.plugin.plugin_name().to_string(),
            params,
        });
    }
    records.sort_by_key(|r| r.node_id);
    serde_yaml::to_string(&records).map_err(|e| WorkflowError::ParseError(e.to_string()))
}

pub fn import(
    text: &str,
    resolve: impl Fn(&str) -> Result<Box<dyn Plugin>, WorkflowError>,
) -> Result<WorkflowTree, WorkflowError> {
    let mut records: Vec<NodeRecord> =
        serde_yaml::from_str(text).map_err(|e| WorkflowError::ParseError(e.to_string()))?;
    records.sort_by_key(|r| r.node_id);

    let mut tree = WorkflowTree::new();
    let mut id_map: HashMap<usize, usize> = HashMap::new();

    for record in &records {
        let mut plugin = resolve(&record.plugin_class_fqname)?;
        for (refkey, raw_value) in &record.params {
            if plugin.params().contains(refkey) {
                let value = ParamValue::Text(raw_value.clone());
                let _ = plugin.params_mut().set_param_value(refkey, value);
            }
        }
        let parent = record
            .parent_id
            .map(|old| {
                id_map
                    .get(&old)
                    .copied()
                    .ok_or(WorkflowError::UnknownNode(old))
            })
            .transpose()?;
        let new_id = tree.create_and_add_node(plugin, parent)?;
        id_map.insert(record.node_id, new_id);
    }
    Ok(tree)
}
