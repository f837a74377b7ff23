//! Cut search grid.

use gs_core::{CutPair, Error, Result};
use serde::{Deserialize, Serialize};

/// Relative slack (in units of `step`) when comparing the last point with `stop`.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Largest number of points an axis may hold.
pub const MAX_AXIS_POINTS: usize = 1_000_000;

/// Evenly spaced axis `start, start + step, …`.
///
/// Points are `start + i·step`; the axis ends before `stop`, or at `stop` when `inclusive`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    /// First point
    pub start: f64,
    /// Upper end
    pub stop: f64,
    /// Spacing between points
    pub step: f64,
    /// Whether `stop` itself is a point
    #[serde(default)]
    pub inclusive: bool,
}

impl GridAxis {
    /// Half-open axis `[start, stop)`.
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step, inclusive: false }
    }

    /// Closed axis `[start, stop]`.
    pub fn inclusive(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step, inclusive: true }
    }

    /// Reject non-finite bounds, non-positive steps, and empty or oversized axes.
    pub fn validate(&self, name: &str) -> Result<()> {
        if !(self.start.is_finite() && self.stop.is_finite() && self.step.is_finite()) {
            return Err(Error::Config(format!("{name} axis bounds must be finite: {self:?}")));
        }
        if self.step <= 0.0 {
            return Err(Error::Config(format!(
                "{name} axis step must be > 0, got {}",
                self.step
            )));
        }
        let n = self.len();
        if n == 0 {
            return Err(Error::Config(format!(
                "{name} axis is empty: start={} stop={} step={}",
                self.start, self.stop, self.step
            )));
        }
        if n > MAX_AXIS_POINTS {
            return Err(Error::Config(format!(
                "{name} axis has too many points ({n} > {MAX_AXIS_POINTS}): step={}",
                self.step
            )));
        }
        Ok(())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        let finite = self.start.is_finite() && self.stop.is_finite() && self.step.is_finite();
        if !finite || self.step <= 0.0 {
            return 0;
        }
        let slack = self.step * EDGE_TOLERANCE;
        let span = self.stop - self.start;
        let limit = if self.inclusive { span + slack } else { span - slack };
        if limit < 0.0 {
            return 0;
        }
        // Float-to-int casts saturate; keep the count saturating too.
        ((limit / self.step).floor() as usize).saturating_add(1)
    }

    /// `true` if the axis has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Axis points in ascending order.
    pub fn points(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.start + i as f64 * self.step).collect()
    }

    /// Last point, if any.
    pub fn last(&self) -> Option<f64> {
        match self.len() {
            0 => None,
            n => Some(self.start + (n - 1) as f64 * self.step),
        }
    }

    /// `true` if `value` lies within `[start, last point]`.
    pub fn covers(&self, value: f64) -> bool {
        let slack = self.step * EDGE_TOLERANCE;
        self.last().is_some_and(|last| value >= self.start - slack && value <= last + slack)
    }
}

/// Two-dimensional grid of (theta², threshold) candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutGrid {
    /// theta² axis (deg²)
    pub theta_squared: GridAxis,
    /// Score-threshold axis
    pub threshold: GridAxis,
}

impl Default for CutGrid {
    fn default() -> Self {
        Self {
            theta_squared: GridAxis::inclusive(0.01, 0.4, 0.01),
            threshold: GridAxis::new(0.2, 1.0, 0.05),
        }
    }
}

impl CutGrid {
    /// Validate both axes.
    pub fn validate(&self) -> Result<()> {
        self.theta_squared.validate("theta_squared")?;
        if self.theta_squared.start <= 0.0 {
            return Err(Error::Config(format!(
                "theta_squared axis must start above 0, got {}",
                self.theta_squared.start
            )));
        }
        self.threshold.validate("threshold")
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.theta_squared.len().saturating_mul(self.threshold.len())
    }

    /// `true` if the grid has no candidates.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidates in traversal order: theta² ascending, then threshold ascending.
    pub fn cuts(&self) -> Vec<CutPair> {
        let thresholds = self.threshold.points();
        self.theta_squared
            .points()
            .into_iter()
            .flat_map(|t2| thresholds.iter().map(move |&thr| CutPair::new(t2, thr)))
            .collect()
    }

    /// `true` if `cut` lies inside the ranges of both axes.
    pub fn covers(&self, cut: &CutPair) -> bool {
        self.theta_squared.covers(cut.theta_squared) && self.threshold.covers(cut.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_axes() {
        let grid = CutGrid::default();
        let t2 = grid.theta_squared.points();
        assert_eq!(t2.len(), 40);
        assert_relative_eq!(t2[0], 0.01);
        assert_relative_eq!(t2[39], 0.4, epsilon = 1e-12);

        let thr = grid.threshold.points();
        assert_eq!(thr.len(), 16);
        assert_relative_eq!(thr[0], 0.2);
        assert_relative_eq!(thr[15], 0.95, epsilon = 1e-12);
        assert!(thr.iter().all(|&t| t < 1.0));

        assert_eq!(grid.len(), 640);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_traversal_order() {
        let grid = CutGrid {
            theta_squared: GridAxis::inclusive(0.1, 0.2, 0.1),
            threshold: GridAxis::new(0.5, 0.7, 0.1),
        };
        let cuts = grid.cuts();
        assert_eq!(cuts.len(), 4);
        assert_relative_eq!(cuts[0].theta_squared, 0.1);
        assert_relative_eq!(cuts[0].threshold, 0.5);
        assert_relative_eq!(cuts[1].theta_squared, 0.1);
        assert_relative_eq!(cuts[1].threshold, 0.6);
        assert_relative_eq!(cuts[2].theta_squared, 0.2);
        assert_relative_eq!(cuts[2].threshold, 0.5);
    }

    #[test]
    fn test_single_point_axes() {
        assert_eq!(GridAxis::inclusive(0.3, 0.3, 0.1).len(), 1);
        assert_eq!(GridAxis::new(0.3, 0.35, 0.1).len(), 1);
        assert_eq!(GridAxis::new(0.3, 0.3, 0.1).len(), 0);
    }

    #[test]
    fn test_invalid_axes() {
        let empty = CutGrid { threshold: GridAxis::new(0.5, 0.5, 0.05), ..CutGrid::default() };
        assert!(matches!(empty.validate(), Err(Error::Config(_))));

        let reversed = CutGrid { threshold: GridAxis::new(0.9, 0.2, 0.05), ..CutGrid::default() };
        assert!(matches!(reversed.validate(), Err(Error::Config(_))));

        let zero_step = CutGrid { threshold: GridAxis::new(0.2, 1.0, 0.0), ..CutGrid::default() };
        assert!(matches!(zero_step.validate(), Err(Error::Config(_))));

        let at_zero =
            CutGrid { theta_squared: GridAxis::inclusive(0.0, 0.4, 0.01), ..CutGrid::default() };
        assert!(matches!(at_zero.validate(), Err(Error::Config(_))));

        let nan = CutGrid { theta_squared: GridAxis::new(f64::NAN, 0.4, 0.01), ..CutGrid::default() };
        assert!(matches!(nan.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_subnormal_step_is_rejected() {
        let axis = GridAxis::new(0.2, 1.0, 5e-324);
        assert_eq!(axis.len(), usize::MAX);
        assert!(!axis.is_empty());
        let grid = CutGrid { threshold: axis, ..CutGrid::default() };
        assert_eq!(grid.len(), usize::MAX);
        assert!(matches!(grid.validate(), Err(Error::Config(_))));

        let dense = GridAxis::inclusive(0.0, 1.0, 1.0 / MAX_AXIS_POINTS as f64);
        assert!(matches!(dense.validate("threshold"), Err(Error::Config(_))));
    }

    #[test]
    fn test_last_point() {
        let grid = CutGrid::default();
        assert_relative_eq!(grid.theta_squared.last().unwrap(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(grid.threshold.last().unwrap(), 0.95, epsilon = 1e-12);
        assert_eq!(GridAxis::new(0.3, 0.3, 0.1).last(), None);
    }

    #[test]
    fn test_covers() {
        let grid = CutGrid::default();
        assert!(grid.covers(&CutPair::new(0.01, 0.95)));
        assert!(grid.covers(&CutPair::new(0.4, 0.2)));
        assert!(!grid.covers(&CutPair::new(0.41, 0.5)));
        assert!(!grid.covers(&CutPair::new(0.1, 0.99)));
    }
}
