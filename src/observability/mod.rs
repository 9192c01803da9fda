//! Structured logging for the execution substrate.
//!
//! Plain [`tracing`] calls are enough for most of the crate. The
//! [`messages`] submodule exists for the handful of events worth giving a
//! stable, queryable shape to: parameter rejections, plugin discovery,
//! shape propagation and controller state transitions.

pub mod messages;
