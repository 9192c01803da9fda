//! Axis metadata: labels, units and ranges.

use serde::{Deserialize, Serialize};

/// The physical range an axis spans.
///
/// `Index` means "no physical calibration is known for this axis"; its
/// values are just the integer indices `0..len`. `Explicit` carries one
/// value per element along the axis, and its length must equal the axis
/// length -- a [`crate::errors::DatasetError::RangeLengthMismatch`] is
/// raised otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxisRange {
    Index,
    Explicit(Vec<f64>),
}

impl AxisRange {
    pub fn len(&self, axis_len: usize) -> usize {
        match self {
            AxisRange::Index => axis_len,
            AxisRange::Explicit(values) => values.len(),
        }
    }

    pub fn is_empty(&self, axis_len: usize) -> bool {
        self.len(axis_len) == 0
    }

    /// The value at a given position along the axis.
    pub fn value_at(&self, index: usize) -> f64 {
        match self {
            AxisRange::Index => index as f64,
            AxisRange::Explicit(values) => values[index],
        }
    }

    /// Restrict this range to the slice `start..end` along the axis.
    pub fn slice(&self, start: usize, end: usize) -> AxisRange {
        match self {
            AxisRange::Index => AxisRange::Index,
            AxisRange::Explicit(values) => AxisRange::Explicit(values[start..end].to_vec()),
        }
    }
}
