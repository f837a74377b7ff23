//! Piecewise-linear interpolation.

use gs_core::{Error, Result};

/// Linear interpolant through `(x_i, y_i)` nodes.
///
/// Outside the node range the first/last segment is extended linearly.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LinearInterpolator {
    /// Build an interpolant; `x` must be strictly increasing with at least two nodes.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::Computation(format!(
                "interpolation nodes length mismatch: {} != {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(Error::Computation(format!(
                "interpolation requires at least 2 nodes, got {}",
                x.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(Error::Computation("interpolation nodes must be finite".to_string()));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Computation(
                "interpolation abscissae must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { x, y })
    }

    /// Evaluate at `xq`.
    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        let hi = self.x.partition_point(|&v| v < xq).clamp(1, n - 1);
        let lo = hi - 1;
        let (x0, x1) = (self.x[lo], self.x[hi]);
        let (y0, y1) = (self.y[lo], self.y[hi]);
        y0 + (xq - x0) * (y1 - y0) / (x1 - x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn interp() -> LinearInterpolator {
        LinearInterpolator::new(vec![0.0, 1.0, 3.0], vec![10.0, 8.0, 0.0]).unwrap()
    }

    #[test]
    fn test_hits_nodes_and_midpoints() {
        let f = interp();
        assert_relative_eq!(f.eval(0.0), 10.0);
        assert_relative_eq!(f.eval(1.0), 8.0);
        assert_relative_eq!(f.eval(3.0), 0.0);
        assert_relative_eq!(f.eval(0.5), 9.0);
        assert_relative_eq!(f.eval(2.0), 4.0);
    }

    #[test]
    fn test_extrapolates_with_end_segments() {
        let f = interp();
        assert_relative_eq!(f.eval(-1.0), 12.0);
        assert_relative_eq!(f.eval(4.0), -4.0);
    }

    #[test]
    fn test_rejects_bad_nodes() {
        assert!(LinearInterpolator::new(vec![0.0], vec![1.0]).is_err());
        assert!(LinearInterpolator::new(vec![0.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(LinearInterpolator::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(LinearInterpolator::new(vec![0.0, f64::NAN], vec![1.0, 2.0]).is_err());
    }
}
