//! Statistical building blocks for gammasens.
//!
//! This crate hosts the small numeric pieces the sensitivity engine is built from:
//! - the Li & Ma on/off significance
//! - Gaussian smoothing of 1-D histograms
//! - fixed-edge histograms
//! - piecewise-linear interpolation with extrapolation
//! - percentile helpers that skip missing (`NaN`) entries

pub mod histogram;
pub mod interp;
pub mod quantile;
pub mod significance;
pub mod smoothing;

pub use histogram::{histogram, uniform_edges};
pub use interp::LinearInterpolator;
pub use quantile::{nan_percentiles, quantile_linear_sorted};
pub use significance::li_ma_significance;
pub use smoothing::gaussian_filter1d;
