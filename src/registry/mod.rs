//! A generic, name-and-extension keyed registry for file-format handlers.
//!
//! This is the one pattern reused across three otherwise unrelated
//! subsystems: result persistence, workflow tree I/O, and scan/experiment
//! context I/O all need "given a file extension, which handler reads or
//! writes it" -- so it is implemented once, generic over the handler trait,
//! rather than three times.

mod format;

pub use format::{FormatHandler, FormatRegistry};
