//! The tree itself: node bookkeeping, shape propagation and per-frame
//! depth-first execution.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::dataset::Dataset;
use crate::errors::WorkflowError;
use crate::observability::messages::workflow::{FrameProcessed, ShapesPropagated};
use crate::observability::messages::StructuredLog;
use crate::plugin::{Plugin, PluginKwargs, Task};

use super::node::WorkflowNode;
use super::text_format;

/// A rooted tree of plugins. Every node but the root has exactly one
/// parent; a node may have any number of children (fan-out), but there is
/// no fan-in -- this is a tree, not a general DAG, so traversal is a plain
/// depth-first walk with no join synchronization to worry about.
#[derive(Default)]
pub struct WorkflowTree {
    nodes: HashMap<usize, WorkflowNode>,
    root: Option<usize>,
    next_id: usize,
}

impl WorkflowTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn node(&self, id: usize) -> Result<&WorkflowNode, WorkflowError> {
        self.nodes.get(&id).ok_or(WorkflowError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: usize) -> Result<&mut WorkflowNode, WorkflowError> {
        self.nodes.get_mut(&id).ok_or(WorkflowError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values()
    }

    /// Add a plugin to the tree. `parent = None` sets the root (only once);
    /// any other value attaches the new node as another child of that
    /// parent.
    pub fn create_and_add_node(
        &mut self,
        plugin: Box<dyn Plugin>,
        parent: Option<usize>,
    ) -> Result<usize, WorkflowError> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(WorkflowError::UnknownNode(parent_id));
            }
        } else if self.root.is_some() {
            return Err(WorkflowError::RootAlreadySet);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, WorkflowNode::new(id, plugin, parent));
        match parent {
            None => self.root = Some(id),
            Some(parent_id) => {
                self.nodes.get_mut(&parent_id).unwrap().children.push(id);
            }
        }
        Ok(id)
    }

    /// Run each plugin's `pre_execute` once, depth-first from the root.
    pub fn prepare_execution(&mut self) -> Result<(), WorkflowError> {
        let root = self.root.ok_or(WorkflowError::EmptyTree)?;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let children = {
                let node = self.nodes.get_mut(&id).expect("node id from tree traversal");
                node.plugin.pre_execute()?;
                node.children.clone()
            };
            stack.extend(children);
        }
        Ok(())
    }

    /// Propagate input/output shapes depth-first from the root, calling
    /// each plugin's `calculate_result_shape` after feeding it its parent's
    /// result shape via `set_input_shape`.
    pub fn propagate_shapes_and_global_config(&mut self) -> Result<(), WorkflowError> {
        let root = self.root.ok_or(WorkflowError::EmptyTree)?;
        let mut stack: Vec<(usize, Option<Vec<isize>>)> = vec![(root, None)];
        let mut count = 0usize;
        while let Some((id, input_shape)) = stack.pop() {
            let (result_shape, children) = {
                let node = self.nodes.get_mut(&id).expect("node id from tree traversal");
                if let Some(shape) = input_shape {
                    node.plugin.set_input_shape(shape);
                }
                let shape = node.plugin.calculate_result_shape()?;
                node.result_shape = Some(shape.clone());
                (shape, node.children.clone())
            };
            count += 1;
            for child in children {
                stack.push((child, Some(result_shape.clone())));
            }
        }
        ShapesPropagated { node_count: count }.log();
        Ok(())
    }

    /// Run one scan-point frame through every node, depth-first, returning
    /// each node's result for this frame. Results are only retained on the
    /// node itself (`node.results`) when `force_store_results` is set or
    /// the node has `keep_results` set; the returned map always has an
    /// entry for every executed node regardless.
    pub fn execute_process(
        &mut self,
        frame_index: usize,
        force_store_results: bool,
    ) -> Result<HashMap<usize, Dataset>, WorkflowError> {
        let root = self.root.ok_or(WorkflowError::EmptyTree)?;
        let mut out = HashMap::new();
        let mut stack: Vec<(usize, Option<Dataset>, PluginKwargs)> =
            vec![(root, None, PluginKwargs::new())];
        while let Some((id, input, kwargs)) = stack.pop() {
            let (result, result_kwargs, children, keep) = {
                let node = self.nodes.get_mut(&id).expect("node id from tree traversal");
                let (result, result_kwargs) =
                    node.plugin.execute(Task::Frame(frame_index), input, kwargs)?;
                if force_store_results || node.keep_results {
                    node.results = Some(result.clone());
                    node.result_kws = Some(result_kwargs.clone());
                }
                (result, result_kwargs, node.children.clone(), node.keep_results)
            };
            let _ = keep;
            for &child in &children {
                stack.push((child, Some(result.clone()), result_kwargs.clone()));
            }
            out.insert(id, result);
        }
        FrameProcessed {
            frame_index,
            nodes_executed: out.len(),
        }
        .log();
        Ok(out)
    }

    /// Every node's result shape, once [`Self::propagate_shapes_and_global_config`]
    /// has run.
    pub fn get_all_result_shapes(&self) -> HashMap<usize, Vec<isize>> {
        self.nodes
            .iter()
            .filter_map(|(&id, n)| n.result_shape.clone().map(|s| (id, s)))
            .collect()
    }

    /// A hash combining each node's id, parent id, plugin type name and
    /// sorted parameter dump -- used to detect whether a previously-saved
    /// set of results still matches the current tree structure.
    pub fn hash(&self) -> u64 {
        let mut ids: Vec<&usize> = self.nodes.keys().collect();
        ids.sort();
        let mut hasher = DefaultHasher::new();
        for id in ids {
            let node = &self.nodes[id];
            node.node_id.hash(&mut hasher);
            node.parent.hash(&mut hasher);
            node.plugin.plugin_name().hash(&mut hasher);
            let mut dump: Vec<String> = node
                .plugin
                .params()
                .iter()
                .map(|p| format!("{}={}", p.refkey(), p.value()))
                .collect();
            dump.sort();
            for entry in dump {
                entry.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// A structurally identical tree with every plugin cloned via
    /// [`Plugin::clone_plugin`] -- used to hand each worker its own
    /// independent tree instance.
    pub fn deep_clone(&self) -> WorkflowTree {
        let mut nodes = HashMap::with_capacity(self.nodes.len());
        for (&id, node) in &self.nodes {
            let mut cloned = WorkflowNode::new(node.node_id, node.plugin.clone_plugin(), node.parent);
            cloned.children = node.children.clone();
            cloned.result_shape = node.result_shape.clone();
            cloned.keep_results = node.keep_results;
            nodes.insert(id, cloned);
        }
        WorkflowTree {
            nodes,
            root: self.root,
            next_id: self.next_id,
        }
    }

    pub fn export_to_string(&self) -> Result<String, WorkflowError> {
        text_format::export(self)
    }

    pub fn import_from_string(
        text: &str,
        resolve: impl Fn(&str) -> Result<Box<dyn Plugin>, WorkflowError>,
    ) -> Result<Self, WorkflowError> {
        text_format::import(text, resolve)
    }
}
