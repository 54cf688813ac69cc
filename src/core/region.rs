use crate::error::{MondrianError, Result};
use std::fmt;

/// Axis-aligned box, one `(low, high)` interval per dimension.
#[derive(Clone, PartialEq)]
pub struct Region {
    bounds: Vec<(f64, f64)>,
}

impl Region {
    pub fn new(bounds: Vec<(f64, f64)>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(MondrianError::InvalidRegion(
                "a region needs at least one dimension".into(),
            ));
        }
        for (dim, &(low, high)) in bounds.iter().enumerate() {
            if !low.is_finite() || !high.is_finite() {
                return Err(MondrianError::InvalidRegion(format!(
                    "dimension {dim} has a non-finite bound"
                )));
            }
            if low > high {
                return Err(MondrianError::InvalidRegion(format!(
                    "dimension {dim} has low {low} above high {high}"
                )));
            }
        }
        Ok(Self { bounds })
    }

    /// `[0, 1]^dims`.
    pub fn unit_cube(dims: usize) -> Result<Self> {
        Self::new(vec![(0.0, 1.0); dims])
    }

    pub fn dimensions(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn interval(&self, dim: usize) -> (f64, f64) {
        self.bounds[dim]
    }

    pub fn length(&self, dim: usize) -> f64 {
        let (low, high) = self.bounds[dim];
        high - low
    }

    /// Sum of the interval lengths. This is the Mondrian split rate of the box.
    pub fn extent(&self) -> f64 {
        self.bounds.iter().map(|(low, high)| high - low).sum()
    }

    pub fn l2_diameter(&self) -> f64 {
        self.bounds
            .iter()
            .map(|(low, high)| (high - low).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.bounds.len()
            && self
                .bounds
                .iter()
                .zip(point)
                .all(|(&(low, high), &x)| low <= x && x <= high)
    }

    /// Cuts the box at `value` on `dim`. The left part keeps the low end.
    pub fn split(&self, dim: usize, value: f64) -> (Region, Region) {
        let (low, high) = self.bounds[dim];
        debug_assert!(low <= value && value <= high, "split value outside interval");

        let mut left = self.bounds.clone();
        let mut right = self.bounds.clone();
        left[dim] = (low, value);
        right[dim] = (value, high);
        (Region { bounds: left }, Region { bounds: right })
    }

    pub fn rounded(&self, decimals: i32) -> Vec<(f64, f64)> {
        let scale = 10f64.powi(decimals);
        self.bounds
            .iter()
            .map(|&(low, high)| ((low * scale).round() / scale, (high * scale).round() / scale))
            .collect()
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bounds.iter().map(|(low, high)| [low, high]))
            .finish()
    }
}
