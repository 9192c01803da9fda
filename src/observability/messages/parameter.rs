//! Message types for parameter validation events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A value was rejected for a parameter, either by type or by choice set.
pub struct ParameterRejected<'a> {
    pub refkey: &'a str,
    pub value: String,
    pub reason: String,
}

impl Display for ParameterRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "rejected value {} for parameter '{}': {}",
            self.value, self.refkey, self.reason
        )
    }
}

impl StructuredLog for ParameterRejected<'_> {
    fn log(&self) {
        tracing::warn!(refkey = self.refkey, value = %self.value, reason = %self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("parameter_rejected", span_name = name, refkey = self.refkey)
    }
}

/// A parameter was reset to its default value.
pub struct ParameterRestoredToDefault<'a> {
    pub refkey: &'a str,
}

impl Display for ParameterRestoredToDefault<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "parameter '{}' restored to its default value", self.refkey)
    }
}

impl StructuredLog for ParameterRestoredToDefault<'_> {
    fn log(&self) {
        tracing::debug!(refkey = self.refkey, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("parameter_restored", span_name = name, refkey = self.refkey)
    }
}
