//! Reference CLI front end over the pydidas-core execution substrate.
//!
//! Concrete plugin implementations are out of this crate's scope -- a real
//! deployment registers its own plugins with [`register_plugins`] before
//! building a tree. This binary exists to wire a [`ScanContext`], a
//! [`WorkflowTree`], the worker pool and result persistence together end to
//! end, not to ship a usable processing pipeline on its own.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use pydidas_core::app::WorkflowProcessingApp;
use pydidas_core::context::ScanContext;
use pydidas_core::errors::WorkflowError;
use pydidas_core::multiprocessing::{new_app_runner, ControllerEvent};
use pydidas_core::plugin::{PluginCollection, Task};
use pydidas_core::results::{NumpyLikeFormat, WorkflowResults};
use pydidas_core::workflow::WorkflowTree;

#[derive(Parser)]
#[command(
    name = "pydidas-core",
    about = "Execution substrate for diffraction image series processing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow tree over every frame of a scan and write results to disk.
    Run {
        /// YAML file describing the scan dimensions.
        #[arg(long)]
        scan: PathBuf,
        /// YAML file holding an exported workflow tree.
        #[arg(long)]
        tree: PathBuf,
        /// Number of worker threads.
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Directory the results are written into.
        #[arg(long)]
        output: PathBuf,
    },
    /// Parse a workflow tree file and report its node count and hash
    /// without running it.
    ValidateTree {
        #[arg(long)]
        tree: PathBuf,
    },
    /// Print the node shapes and titles stored in a results directory.
    InspectResults {
        #[arg(long)]
        directory: PathBuf,
    },
}

#[derive(Deserialize)]
struct ScanDimConfig {
    label: String,
    unit: String,
    n_points: usize,
    delta: f64,
    offset: f64,
}

#[derive(Deserialize)]
struct ScanConfig {
    dimensions: Vec<ScanDimConfig>,
    #[serde(default = "default_frames_per_point")]
    scan_frames_per_point: usize,
}

fn default_frames_per_point() -> usize {
    1
}

/// Hook point for a deployment's concrete plugins. Empty here: this crate
/// defines the plugin contract and the tree/worker-pool machinery around
/// it, not any implementations of the contract itself.
fn register_plugins(_plugins: &mut PluginCollection) {}

fn load_scan(path: &Path) -> Result<ScanContext> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading scan config {}", path.display()))?;
    let config: ScanConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing scan config {}", path.display()))?;
    let mut scan = ScanContext::new();
    for dim in config.dimensions {
        scan.add_dimension(dim.label, dim.unit, dim.n_points, dim.delta, dim.offset);
    }
    scan.set_scan_frames_per_point(config.scan_frames_per_point);
    Ok(scan)
}

fn load_tree(path: &Path, plugins: &PluginCollection) -> Result<WorkflowTree> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading workflow tree {}", path.display()))?;
    let tree = WorkflowTree::import_from_string(&text, |name| {
        plugins.get(name).map_err(WorkflowError::from)
    })
    .with_context(|| format!("parsing workflow tree {}", path.display()))?;
    Ok(tree)
}

fn run(scan_path: PathBuf, tree_path: PathBuf, workers: usize, output: PathBuf) -> Result<()> {
    let mut plugins = PluginCollection::new();
    register_plugins(&mut plugins);

    let scan = load_scan(&scan_path)?;
    let tree = load_tree(&tree_path, &plugins)?;

    let mut results = WorkflowResults::new();
    let app = WorkflowProcessingApp::new(&scan, tree)?;
    results.update_shapes_from_scan_and_workflow(&scan, app.tree())?;

    let n_frames = scan.n_frames_required();
    let mut runner = new_app_runner(Box::new(app), workers, false);
    runner.start().context("starting the worker pool")?;

    let mut remaining = n_frames;
    while remaining > 0 {
        match runner.recv_event_timeout(Duration::from_secs(5)) {
            Some(ControllerEvent::Results(Task::Frame(frame_index), Ok(frame_result))) => {
                results
                    .store_results(&scan, frame_index, frame_result)
                    .context("storing a frame's results")?;
                remaining -= 1;
            }
            Some(ControllerEvent::Results(task, Err(err))) => {
                runner.stop();
                anyhow::bail!("task {task:?} failed: {err}");
            }
            Some(ControllerEvent::Results(Task::Taskless, Ok(_))) => {}
            Some(ControllerEvent::Progress(_)) | Some(ControllerEvent::WorkersFinished) | None => {}
        }
    }
    runner.stop();

    let format = NumpyLikeFormat;
    format.save_results_to_disk(&results, &output)?;
    println!(
        "wrote {} node(s) to {}",
        results.shapes().len(),
        output.display()
    );
    Ok(())
}

fn validate_tree(tree_path: PathBuf) -> Result<()> {
    let mut plugins = PluginCollection::new();
    register_plugins(&mut plugins);

    let tree = load_tree(&tree_path, &plugins)?;
    let node_count = tree.nodes().count();
    println!("{} node(s), root = {:?}", node_count, tree.root());
    println!("structural hash: {:#x}", tree.hash());
    Ok(())
}

fn inspect_results(directory: PathBuf) -> Result<()> {
    let format = NumpyLikeFormat;
    let results = format
        .import_data_from_directory(&directory)
        .with_context(|| format!("reading results from {}", directory.display()))?;

    let mut node_ids: Vec<&usize> = results.shapes().keys().collect();
    node_ids.sort();
    println!("source hash: {:#x}", results.source_hash());
    for node_id in node_ids {
        let shape = &results.shapes()[node_id];
        let title = results
            .result_titles()
            .get(node_id)
            .map(String::as_str)
            .unwrap_or("<untitled>");
        println!("  node {node_id}: {title} {shape:?}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scan,
            tree,
            workers,
            output,
        } => run(scan, tree, workers, output)?,
        Commands::ValidateTree { tree } => validate_tree(tree)?,
        Commands::InspectResults { directory } => inspect_results(directory)?,
    }
    Ok(())
}
