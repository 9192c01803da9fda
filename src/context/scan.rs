//! The scan geometry: dimensions, point count, and frame bookkeeping.

use crate::dataset::AxisRange;
use crate::errors::ContextError;
use crate::parameter::{ParamType, ParamValue, Parameter, ParameterCollection};

/// How multiple raw detector frames recorded at the same scan point are
/// combined into that point's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiFrameHandling {
    Average,
    Sum,
    Maximum,
    /// Keep every frame, adding a new leading axis of length
    /// `scan_frames_per_point` instead of combining them.
    Stack,
}

impl MultiFrameHandling {
    fn as_str(self) -> &'static str {
        match self {
            MultiFrameHandling::Average => "Average",
            MultiFrameHandling::Sum => "Sum",
            MultiFrameHandling::Maximum => "Maximum",
            MultiFrameHandling::Stack => "Stack",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "Average" => Some(Self::Average),
            "Sum" => Some(Self::Sum),
            "Maximum" => Some(Self::Maximum),
            "Stack" => Some(Self::Stack),
            _ => None,
        }
    }
}

struct ScanDimension {
    label: String,
    unit: String,
    n_points: usize,
    delta: f64,
    offset: f64,
}

/// The process-wide description of the scan geometry: how many dimensions,
/// how many points per dimension, and how raw frames map onto scan points.
///
/// Frame-index to scan-position unravelling uses standard row-major (`C`)
/// order: dimension 0 is the slowest-varying axis, the last declared
/// dimension is the fastest-varying one -- the same convention numpy uses
/// by default, which the upstream scan/detector stack this is modelled on
/// follows throughout.
pub struct ScanContext {
    dims: Vec<ScanDimension>,
    scan_frames_per_point: usize,
    scan_multi_frame_handling: MultiFrameHandling,
    params: ParameterCollection,
}

impl ScanContext {
    pub fn new() -> Self {
        Self {
            dims: Vec::new(),
            scan_frames_per_point: 1,
            scan_multi_frame_handling: MultiFrameHandling::Average,
            params: ParameterCollection::new(),
        }
    }

    /// Append a scan dimension, slowest-varying axes added first.
    pub fn add_dimension(
        &mut self,
        label: impl Into<String>,
        unit: impl Into<String>,
        n_points: usize,
        delta: f64,
        offset: f64,
    ) {
        self.dims.push(ScanDimension {
            label: label.into(),
            unit: unit.into(),
            n_points,
            delta,
            offset,
        });
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// The number of scan points per dimension, dimension 0 first.
    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(|d| d.n_points).collect()
    }

    /// Total number of distinct scan points (the product of `shape()`).
    pub fn max_scan_points(&self) -> usize {
        self.dims.iter().map(|d| d.n_points).product()
    }

    pub fn n_points(&self) -> usize {
        self.max_scan_points()
    }

    pub fn scan_frames_per_point(&self) -> usize {
        self.scan_frames_per_point
    }

    pub fn set_scan_frames_per_point(&mut self, n: usize) {
        self.scan_frames_per_point = n;
    }

    pub fn multi_frame_handling(&self) -> MultiFrameHandling {
        self.scan_multi_frame_handling
    }

    pub fn set_multi_frame_handling(&mut self, handling: MultiFrameHandling) {
        self.scan_multi_frame_handling = handling;
    }

    /// Total raw detector frames this scan will produce.
    pub fn n_frames_required(&self) -> usize {
        self.max_scan_points() * self.scan_frames_per_point
    }

    /// The calibrated axis range for one scan dimension.
    pub fn get_range_for_dim(&self, dim: usize) -> Result<AxisRange, ContextError> {
        let d = self
            .dims
            .get(dim)
            .ok_or(ContextError::EmptyScan)?;
        let values = (0..d.n_points)
            .map(|i| d.offset + i as f64 * d.delta)
            .collect();
        Ok(AxisRange::Explicit(values))
    }

    /// The raw frame indices belonging to one scan point, given
    /// `scan_frames_per_point` frames are recorded contiguously per point.
    pub fn frame_indices_per_scan_point(&self, scan_point: usize) -> Vec<usize> {
        let start = scan_point * self.scan_frames_per_point;
        (start..start + self.scan_frames_per_point).collect()
    }

    /// Unravel a raw frame index into its N-D scan position.
    ///
    /// Frames sharing a scan point (see [`Self::scan_frames_per_point`])
    /// all map to the same position.
    pub fn get_frame_position_in_scan(&self, frame_index: usize) -> Result<Vec<usize>, ContextError> {
        if self.dims.is_empty() {
            return Err(ContextError::EmptyScan);
        }
        let n_frames = self.n_frames_required();
        if frame_index >= n_frames {
            return Err(ContextError::FrameIndexOutOfRange {
                frame_index,
                n_points: self.max_scan_points(),
            });
        }
        let mut scan_point = frame_index / self.scan_frames_per_point;
        let mut position = vec![0usize; self.dims.len()];
        for (axis, dim) in self.dims.iter().enumerate().rev() {
            position[axis] = scan_point % dim.n_points;
            scan_point /= dim.n_points;
        }
        Ok(position)
    }

    pub fn params(&self) -> &ParameterCollection {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterCollection {
        &mut self.params
    }

    /// Store the multi-frame handling mode as a parameter value as well,
    /// for tools that serialize the whole context through its
    /// `ParameterCollection` rather than through typed accessors.
    pub fn sync_params(&mut self) -> Result<(), ContextError> {
        let value = ParamValue::Text(self.scan_multi_frame_handling.as_str().to_string());
        if self.params.contains("scan_multi_frame_handling") {
            self.params
                .set_param_value("scan_multi_frame_handling", value)?;
        } else {
            self.params.add_param(Parameter::new(
                "scan_multi_frame_handling",
                "Multi-frame handling",
                ParamType::Enum,
                value,
                false,
                Some(
                    ["Average", "Sum", "Maximum", "Stack"]
                        .iter()
                        .map(|s| ParamValue::Text(s.to_string()))
                        .collect(),
                ),
                "",
                "How frames sharing a scan point are combined.",
            )?)?;
        }
        Ok(())
    }

    /// Load the multi-frame handling mode back from the parameter
    /// collection, if it was changed there directly.
    pub fn load_multi_frame_handling_from_params(&mut self) -> Result<(), ContextError> {
        if let Ok(value) = self.params.get_param_value("scan_multi_frame_handling") {
            if let Some(s) = value.as_str() {
                if let Some(handling) = MultiFrameHandling::from_str(s) {
                    self.scan_multi_frame_handling = handling;
                }
            }
        }
        Ok(())
    }
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_d_scan() -> ScanContext {
        let mut scan = ScanContext::new();
        scan.add_dimension("y", "mm", 3, 1.0, 0.0);
        scan.add_dimension("x", "mm", 4, 0.5, -1.0);
        scan
    }

    #[test]
    fn shape_and_point_count() {
        let scan = two_d_scan();
        assert_eq!(scan.shape(), vec![3, 4]);
        assert_eq!(scan.max_scan_points(), 12);
        assert_eq!(scan.n_frames_required(), 12);
    }

    #[test]
    fn frame_position_is_row_major() {
        let scan = two_d_scan();
        // dim0 (y) slowest, dim1 (x) fastest: frame 4 -> (1, 0)
        assert_eq!(scan.get_frame_position_in_scan(4).unwrap(), vec![1, 0]);
        assert_eq!(scan.get_frame_position_in_scan(0).unwrap(), vec![0, 0]);
        assert_eq!(scan.get_frame_position_in_scan(11).unwrap(), vec![2, 3]);
    }

    #[test]
    fn multi_frame_grouping_maps_shared_points() {
        let mut scan = two_d_scan();
        scan.set_scan_frames_per_point(2);
        assert_eq!(scan.n_frames_required(), 24);
        assert_eq!(
            scan.get_frame_position_in_scan(0).unwrap(),
            scan.get_frame_position_in_scan(1).unwrap()
        );
        assert_eq!(scan.frame_indices_per_scan_point(0), vec![0, 1]);
    }

    #[test]
    fn out_of_range_frame_index_errors() {
        let scan = two_d_scan();
        assert!(matches!(
            scan.get_frame_position_in_scan(12),
            Err(ContextError::FrameIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn range_for_dim_uses_delta_and_offset() {
        let scan = two_d_scan();
        let range = scan.get_range_for_dim(1).unwrap();
        assert_eq!(range, AxisRange::Explicit(vec![-1.0, -0.5, 0.0, 0.5]));
    }
}
