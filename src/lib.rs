//! pydidas-core: the execution substrate for pydidas, an extensible
//! pipeline engine for analyzing 2D diffraction image series recorded
//! during synchrotron scans.
//!
//! This crate covers parameters, datasets, process-wide contexts, the
//! plugin contract, workflow trees, multiprocessing-driven applications,
//! and result assembly/persistence -- the non-GUI substrate a concrete
//! pydidas front end or batch driver is built on top of.

pub mod app;
pub mod context;
pub mod dataset;
pub mod errors;
pub mod multiprocessing;
pub mod observability;
pub mod parameter;
pub mod plugin;
pub mod registry;
pub mod results;
pub mod workflow;
