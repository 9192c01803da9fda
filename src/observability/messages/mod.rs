//! Structured message types for logging and tracing.
//!
//! Each message type implements `Display` for a human-readable line and
//! [`StructuredLog`] for machine-readable fields plus a tracing span. Usage:
//!
//! ```ignore
//! use pydidas_core::observability::messages::{StructuredLog, parameter::ParameterRejected};
//!
//! let msg = ParameterRejected { refkey: "n_workers", value: "-1".into(), reason: "must be positive".into() };
//! msg.log();
//! ```

pub mod controller;
pub mod parameter;
pub mod plugin;
pub mod results;
pub mod workflow;

use tracing::Span;

/// A loggable event with both a human-readable [`Display`](std::fmt::Display)
/// form and a structured, queryable form.
pub trait StructuredLog {
    /// Emit this event at its natural log level, with structured fields
    /// attached alongside the human-readable message.
    fn log(&self);

    /// Build a tracing span carrying this event's fields as attributes.
    fn span(&self, name: &str) -> Span;
}
