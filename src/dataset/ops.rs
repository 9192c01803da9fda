//! The [`Dataset`] buffer and its shape-aware operations.

use std::collections::HashMap;
use std::ops::{Add, Mul, Sub};

use crate::errors::DatasetError;

use super::axis::AxisRange;

/// A dense, row-major N-dimensional array carrying per-axis labels, units
/// and ranges plus a free-form metadata map.
///
/// There is no general-purpose tensor crate in the dependency stack, and
/// pulling one in for this single internal type would be disproportionate
/// -- a flat buffer plus an explicit shape is the same representation this
/// crate's own worker queues and result composites already use.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Vec<f64>,
    shape: Vec<usize>,
    axis_labels: HashMap<usize, String>,
    axis_units: HashMap<usize, String>,
    axis_ranges: HashMap<usize, AxisRange>,
    metadata: HashMap<String, String>,
}

impl Dataset {
    /// Build a dataset from a flat, row-major buffer and a shape. Axis
    /// labels/units default to empty strings and ranges default to
    /// `Index`.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self, DatasetError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(DatasetError::ShapeMismatch {
                expected: shape.clone(),
                actual: vec![data.len()],
            });
        }
        let axis_labels = (0..shape.len()).map(|i| (i, String::new())).collect();
        let axis_units = (0..shape.len()).map(|i| (i, String::new())).collect();
        let axis_ranges = (0..shape.len()).map(|i| (i, AxisRange::Index)).collect();
        Ok(Self {
            data,
            shape,
            axis_labels,
            axis_units,
            axis_ranges,
            metadata: HashMap::new(),
        })
    }

    /// A dataset of zeros with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self::new(vec![0.0; len], shape).expect("zeros shape always matches buffer length")
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn axis_label(&self, axis: usize) -> Option<&str> {
        self.axis_labels.get(&axis).map(|s| s.as_str())
    }

    pub fn set_axis_label(&mut self, axis: usize, label: impl Into<String>) {
        self.axis_labels.insert(axis, label.into());
    }

    pub fn axis_unit(&self, axis: usize) -> Option<&str> {
        self.axis_units.get(&axis).map(|s| s.as_str())
    }

    pub fn set_axis_unit(&mut self, axis: usize, unit: impl Into<String>) {
        self.axis_units.insert(axis, unit.into());
    }

    pub fn axis_range(&self, axis: usize) -> Option<&AxisRange> {
        self.axis_ranges.get(&axis)
    }

    /// Set an explicit range for an axis. Fails if its length doesn't match
    /// the axis length.
    pub fn set_axis_range(&mut self, axis: usize, range: AxisRange) -> Result<(), DatasetError> {
        let axis_len = *self
            .shape
            .get(axis)
            .ok_or(DatasetError::AxisOutOfBounds {
                axis,
                ndim: self.ndim(),
            })?;
        let range_len = range.len(axis_len);
        if range_len != axis_len {
            return Err(DatasetError::RangeLengthMismatch {
                axis,
                range_len,
                axis_len,
            });
        }
        self.axis_ranges.insert(axis, range);
        Ok(())
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    fn flat_index(&self, index: &[usize]) -> Result<usize, DatasetError> {
        if index.len() != self.shape.len() {
            return Err(DatasetError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        let mut flat = 0usize;
        for (i, &dim) in index.iter().enumerate() {
            if dim >= self.shape[i] {
                return Err(DatasetError::IndexOutOfBounds {
                    index: index.to_vec(),
                    shape: self.shape.clone(),
                });
            }
            flat = flat * self.shape[i] + dim;
        }
        Ok(flat)
    }

    pub fn get(&self, index: &[usize]) -> Result<f64, DatasetError> {
        Ok(self.data[self.flat_index(index)?])
    }

    pub fn set(&mut self, index: &[usize], value: f64) -> Result<(), DatasetError> {
        let flat = self.flat_index(index)?;
        self.data[flat] = value;
        Ok(())
    }

    /// Shift every axis-keyed map's keys down by one for axes after
    /// `removed_axis`, and drop the entry for `removed_axis` itself --
    /// used after a reduction or a single-index slice collapses a
    /// dimension.
    fn renumber_axes_after_removal(&mut self, removed_axis: usize) {
        for map_axes in [
            &mut self.axis_labels as &mut dyn AxisMap,
            &mut self.axis_units,
            &mut self.axis_ranges,
        ] {
            map_axes.remove_and_shift(removed_axis);
        }
    }

    /// Take a sub-range `start..end` along `axis`, keeping that axis in the
    /// result (rank unchanged).
    pub fn slice_range(
        &self,
        axis: usize,
        start: usize,
        end: usize,
    ) -> Result<Dataset, DatasetError> {
        if axis >= self.ndim() {
            return Err(DatasetError::AxisOutOfBounds {
                axis,
                ndim: self.ndim(),
            });
        }
        if end > self.shape[axis] || start > end {
            return Err(DatasetError::IndexOutOfBounds {
                index: vec![start, end],
                shape: self.shape.clone(),
            });
        }
        let mut new_shape = self.shape.clone();
        new_shape[axis] = end - start;
        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();
        let mut out = Vec::with_capacity(outer * (end - start) * inner);
        for o in 0..outer {
            for a in start..end {
                let base = (o * self.shape[axis] + a) * inner;
                out.extend_from_slice(&self.data[base..base + inner]);
            }
        }
        let mut result = Dataset::new(out, new_shape)?;
        result.axis_labels = self.axis_labels.clone();
        result.axis_units = self.axis_units.clone();
        result.axis_ranges = self.axis_ranges.clone();
        result
            .axis_ranges
            .insert(axis, self.axis_ranges[&axis].slice(start, end));
        result.metadata = self.metadata.clone();
        Ok(result)
    }

    /// Take a single index along `axis`, collapsing that axis (rank
    /// decreases by one, remaining axes renumbered).
    pub fn slice_index(&self, axis: usize, index: usize) -> Result<Dataset, DatasetError> {
        let sliced = self.slice_range(axis, index, index + 1)?;
        sliced.drop_axis(axis)
    }

    fn drop_axis(&self, axis: usize) -> Result<Dataset, DatasetError> {
        let mut new_shape = self.shape.clone();
        new_shape.remove(axis);
        let mut result = Dataset::new(self.data.clone(), new_shape)?;
        result.axis_labels = self.axis_labels.clone();
        result.axis_units = self.axis_units.clone();
        result.axis_ranges = self.axis_ranges.clone();
        result.renumber_axes_after_removal(axis);
        result.metadata = self.metadata.clone();
        Ok(result)
    }

    fn reduce_axis(
        &self,
        axis: usize,
        init: f64,
        combine: impl Fn(f64, f64) -> f64,
    ) -> Result<Dataset, DatasetError> {
        if axis >= self.ndim() {
            return Err(DatasetError::AxisOutOfBounds {
                axis,
                ndim: self.ndim(),
            });
        }
        let mut new_shape = self.shape.clone();
        new_shape.remove(axis);
        let outer: usize = self.shape[..axis].iter().product();
        let axis_len = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();
        let mut out = vec![init; outer * inner];
        for o in 0..outer {
            for a in 0..axis_len {
                let base = (o * axis_len + a) * inner;
                for i in 0..inner {
                    let slot = o * inner + i;
                    out[slot] = combine(out[slot], self.data[base + i]);
                }
            }
        }
        let mut result = Dataset::new(out, new_shape)?;
        result.axis_labels = self.axis_labels.clone();
        result.axis_units = self.axis_units.clone();
        result.axis_ranges = self.axis_ranges.clone();
        result.renumber_axes_after_removal(axis);
        result.metadata = self.metadata.clone();
        Ok(result)
    }

    pub fn sum_axis(&self, axis: usize) -> Result<Dataset, DatasetError> {
        self.reduce_axis(axis, 0.0, |a, b| a + b)
    }

    pub fn mean_axis(&self, axis: usize) -> Result<Dataset, DatasetError> {
        let n = self.shape[axis] as f64;
        let summed = self.sum_axis(axis)?;
        Ok(summed.map_values(|v| v / n))
    }

    pub fn max_axis(&self, axis: usize) -> Result<Dataset, DatasetError> {
        self.reduce_axis(axis, f64::NEG_INFINITY, f64::max)
    }

    fn map_values(mut self, f: impl Fn(f64) -> f64) -> Dataset {
        for v in self.data.iter_mut() {
            *v = f(*v);
        }
        self
    }

    /// Merge the first `n` axes into a single leading axis, in row-major
    /// order. The merged axis gets an [`AxisRange::Index`] range; axes
    /// after the merged group keep their labels/units/ranges, renumbered
    /// down by `n - 1`.
    pub fn flatten_leading_axes(&self, n: usize) -> Result<Dataset, DatasetError> {
        if n == 0 || n > self.ndim() {
            return Err(DatasetError::AxisOutOfBounds {
                axis: n,
                ndim: self.ndim(),
            });
        }
        let merged: usize = self.shape[..n].iter().product();
        let mut new_shape = vec![merged];
        new_shape.extend_from_slice(&self.shape[n..]);
        let mut result = Dataset::new(self.data.clone(), new_shape)?;
        result.set_axis_label(0, "scan point");
        for axis in n..self.ndim() {
            let new_axis = axis - n + 1;
            if let Some(label) = self.axis_label(axis) {
                result.set_axis_label(new_axis, label);
            }
            if let Some(unit) = self.axis_unit(axis) {
                result.set_axis_unit(new_axis, unit);
            }
            if let Some(range) = self.axis_range(axis) {
                result.axis_ranges.insert(new_axis, range.clone());
            }
        }
        result.metadata = self.metadata.clone();
        Ok(result)
    }

    fn elementwise(&self, other: &Dataset, op: impl Fn(f64, f64) -> f64) -> Result<Dataset, DatasetError> {
        if self.shape != other.shape {
            return Err(DatasetError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| op(*a, *b))
            .collect();
        let mut result = Dataset::new(data, self.shape.clone())?;
        result.axis_labels = self.axis_labels.clone();
        result.axis_units = self.axis_units.clone();
        result.axis_ranges = self.axis_ranges.clone();
        result.metadata = self.metadata.clone();
        Ok(result)
    }
}

/// Helper to shift/remove entries in one of the three axis-keyed maps.
/// Implemented once and applied to all three via a trait object rather than
/// duplicating the same renumbering loop three times.
trait AxisMap {
    fn remove_and_shift(&mut self, removed_axis: usize);
}

impl AxisMap for HashMap<usize, String> {
    fn remove_and_shift(&mut self, removed_axis: usize) {
        shift_keys(self, removed_axis);
    }
}

impl AxisMap for HashMap<usize, AxisRange> {
    fn remove_and_shift(&mut self, removed_axis: usize) {
        shift_keys(self, removed_axis);
    }
}

fn shift_keys<V>(map: &mut HashMap<usize, V>, removed_axis: usize) {
    map.remove(&removed_axis);
    let mut shifted: Vec<(usize, V)> = map
        .drain()
        .map(|(k, v)| if k > removed_axis { (k - 1, v) } else { (k, v) })
        .collect();
    for (k, v) in shifted.drain(..) {
        map.insert(k, v);
    }
}

macro_rules! impl_elementwise_op {
    ($trait_:ident, $method:ident, $op:tt) => {
        impl $trait_ for &Dataset {
            type Output = Result<Dataset, DatasetError>;
            fn $method(self, rhs: &Dataset) -> Self::Output {
                self.elementwise(rhs, |a, b| a $op b)
            }
        }
    };
}

impl_elementwise_op!(Add, add, +);
impl_elementwise_op!(Sub, sub, -);
impl_elementwise_op!(Mul, mul, *);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        // shape (2, 3): [[0,1,2],[3,4,5]]
        Dataset::new((0..6).map(|v| v as f64).collect(), vec![2, 3]).unwrap()
    }

    #[test]
    fn get_and_set_round_trip() {
        let mut d = sample();
        assert_eq!(d.get(&[1, 2]).unwrap(), 5.0);
        d.set(&[0, 0], 42.0).unwrap();
        assert_eq!(d.get(&[0, 0]).unwrap(), 42.0);
    }

    #[test]
    fn sum_axis_renumbers_remaining_axes() {
        let mut d = sample();
        d.set_axis_label(0, "scan");
        d.set_axis_label(1, "detector");
        let summed = d.sum_axis(0).unwrap();
        assert_eq!(summed.shape(), &[3]);
        assert_eq!(summed.axis_label(0), Some("detector"));
        assert_eq!(summed.as_slice(), &[3.0, 5.0, 7.0]);
    }

    #[test]
    fn slice_index_collapses_axis() {
        let d = sample();
        let row = d.slice_index(0, 1).unwrap();
        assert_eq!(row.shape(), &[3]);
        assert_eq!(row.as_slice(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn slice_range_keeps_rank_and_shrinks_explicit_range() {
        let mut d = sample();
        d.set_axis_range(1, AxisRange::Explicit(vec![10.0, 20.0, 30.0]))
            .unwrap();
        let sub = d.slice_range(1, 1, 3).unwrap();
        assert_eq!(sub.shape(), &[2, 2]);
        assert_eq!(
            sub.axis_range(1),
            Some(&AxisRange::Explicit(vec![20.0, 30.0]))
        );
    }

    #[test]
    fn range_length_mismatch_is_rejected() {
        let mut d = sample();
        let err = d
            .set_axis_range(1, AxisRange::Explicit(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, DatasetError::RangeLengthMismatch { .. }));
    }

    #[test]
    fn flatten_leading_axes_merges_scan_dims() {
        // shape (2, 3, 2): two scan dims of size 2x3, one detector axis of size 2
        let d = Dataset::new((0..12).map(|v| v as f64).collect(), vec![2, 3, 2]).unwrap();
        let flat = d.flatten_leading_axes(2).unwrap();
        assert_eq!(flat.shape(), &[6, 2]);
        assert_eq!(flat.as_slice(), d.as_slice());
    }

    #[test]
    fn elementwise_add_requires_matching_shape() {
        let a = sample();
        let b = Dataset::zeros(vec![2, 3]);
        let sum = (&a + &b).unwrap();
        assert_eq!(sum.as_slice(), a.as_slice());
        let bad = Dataset::zeros(vec![3, 2]);
        assert!((&a + &bad).is_err());
    }
}
