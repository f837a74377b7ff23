//! # gs-inference
//!
//! Sensitivity engine for gamma-ray point sources.
//!
//! For every energy bin the [`BinnedSensitivityPipeline`]:
//! 1. searches a [`CutGrid`] of (theta², score threshold) pairs for the cut with the
//!    highest Li & Ma significance ([`CutOptimizer`]), estimating the background with one
//!    of the [`BackgroundStrategy`] variants;
//! 2. recounts signal and background at the winning cut;
//! 3. resamples both counts and finds the flux scaling that reaches the target
//!    significance ([`SensitivityScaler`]).
//!
//! Bins run in parallel on rayon; every bin owns its own seeded random stream, so a
//! fixed seed reproduces a table exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod background;
pub mod cut_optimizer;
pub mod grid;
pub mod pipeline;
pub mod scaler;

pub use background::{BackgroundEstimate, BackgroundStrategy, PreparedBackground, Statistics};
pub use cut_optimizer::{CutOptimizer, CutSearchResult, GridPoint, Rejection, Verdict};
pub use grid::{CutGrid, GridAxis};
pub use pipeline::{BinnedSensitivityPipeline, SensitivityConfig, attach_flux};
pub use scaler::{ScalerConfig, SensitivityScaler};
