//! Background estimation in the off region.
//!
//! Every strategy is asked for the background inside a region of size
//! `w = theta² / alpha` above a score threshold. Its output is therefore already on the
//! off-region scale: multiplying by `alpha` makes it comparable to the on-region signal.
//!
//! The four strategies trade smoothing against minimum-statistics requirements and are
//! kept separate on purpose:
//!
//! | strategy      | estimate                                    | insufficient when    |
//! |---------------|---------------------------------------------|----------------------|
//! | `exact`       | direct count with `theta² <= w`             | `raw < 10`           |
//! | `simple`      | mean over width-`w` slices of `[0, 0.6)`    | `raw / alpha < 10`   |
//! | `histogram`   | mean over histogram bins of `[0, 0.6)`      | `raw / alpha < 5`    |
//! | `extrapolate` | smoothed score survival curve × `w`         | never                |

use std::fmt;
use std::str::FromStr;

use gs_core::{CutPair, Error, RegionCounts, Result};
use gs_events::{EventSelector, EventTable};
use gs_prob::{LinearInterpolator, gaussian_filter1d, histogram, uniform_edges};
use serde::{Deserialize, Serialize};

/// Upper theta² edge (deg²) of the control region used by `simple` and `histogram`.
pub const CONTROL_REGION_MAX: f64 = 0.6;

/// Upper theta² edge (deg²) of the events feeding the `extrapolate` score curve.
pub const EXTRAPOLATION_REGION_MAX: f64 = 0.5;

/// Number of score bins of the `extrapolate` curve over `[0, 1]`.
pub const EXTRAPOLATION_SCORE_BINS: usize = 29;

const EXACT_MIN_RAW: f64 = 10.0;
const SIMPLE_MIN_RAW: f64 = 10.0;
const HISTOGRAM_MIN_RAW: f64 = 5.0;

fn default_sigma() -> f64 {
    1.0
}

/// Background estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BackgroundStrategy {
    /// Direct count in the off region.
    Exact,
    /// Mean slice count over the control region.
    Simple,
    /// Mean histogram-bin count over the control region.
    Histogram,
    /// Smoothed, interpolated survival curve of the score distribution.
    Extrapolate {
        /// Width of the Gaussian smoothing kernel, in score bins.
        #[serde(default = "default_sigma")]
        sigma: f64,
    },
}

impl Default for BackgroundStrategy {
    fn default() -> Self {
        Self::Extrapolate { sigma: default_sigma() }
    }
}

impl BackgroundStrategy {
    /// Short name as used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Simple => "simple",
            Self::Histogram => "histogram",
            Self::Extrapolate { .. } => "extrapolate",
        }
    }

    /// Check strategy parameters.
    pub fn validate(&self) -> Result<()> {
        if let Self::Extrapolate { sigma } = self {
            if !sigma.is_finite() || *sigma < 0.0 {
                return Err(Error::Config(format!(
                    "extrapolate sigma must be finite and >= 0, got {sigma}"
                )));
            }
        }
        Ok(())
    }

    /// Bind the strategy to one background sample.
    ///
    /// Work that depends only on the sample (the `extrapolate` curves) happens here, once.
    pub fn prepare<'a>(
        &self,
        background: &'a EventTable,
        selector: EventSelector,
    ) -> Result<PreparedBackground<'a>> {
        self.validate()?;
        let model = match *self {
            Self::Exact => Model::Exact,
            Self::Simple => Model::Simple,
            Self::Histogram => Model::Histogram,
            Self::Extrapolate { sigma } => {
                Model::Extrapolate(SurvivalCurves::build(background, sigma)?)
            }
        };
        Ok(PreparedBackground { table: background, selector, model })
    }
}

impl fmt::Display for BackgroundStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackgroundStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(Self::Exact),
            "simple" => Ok(Self::Simple),
            "histogram" => Ok(Self::Histogram),
            "extrapolate" => Ok(Self::default()),
            other => Err(Error::Config(format!(
                "unknown background method '{other}' (expected exact, simple, histogram or extrapolate)"
            ))),
        }
    }
}

/// Whether an estimate rests on enough simulated events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistics {
    /// Enough raw events.
    Sufficient,
    /// Too few raw events; the candidate must not be used.
    Insufficient,
}

/// Background estimate for one off region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundEstimate {
    /// Weighted background and its raw (or proxy) sample size.
    pub counts: RegionCounts,
    /// Statistics verdict of the strategy.
    pub statistics: Statistics,
}

impl BackgroundEstimate {
    fn checked(counts: RegionCounts, enough: bool) -> Self {
        let statistics = if enough { Statistics::Sufficient } else { Statistics::Insufficient };
        Self { counts, statistics }
    }

    /// `true` if the strategy reported insufficient statistics.
    pub fn is_insufficient(&self) -> bool {
        self.statistics == Statistics::Insufficient
    }
}

/// A strategy bound to a background sample.
#[derive(Debug, Clone)]
pub struct PreparedBackground<'a> {
    table: &'a EventTable,
    selector: EventSelector,
    model: Model,
}

#[derive(Debug, Clone)]
enum Model {
    Exact,
    Simple,
    Histogram,
    Extrapolate(SurvivalCurves),
}

impl PreparedBackground<'_> {
    /// Background in the off region of `cut` (size `cut.theta_squared / alpha`).
    pub fn estimate(&self, cut: &CutPair, alpha: f64) -> Result<BackgroundEstimate> {
        let off = cut.off_region(alpha);
        let estimate = match &self.model {
            Model::Exact => {
                let counts = self.selector.count_in_region(self.table, &off, 1.0)?;
                BackgroundEstimate::checked(counts, counts.raw >= EXACT_MIN_RAW)
            }
            Model::Simple => {
                let total = count_above(self.table, off.threshold, |t2| t2 < CONTROL_REGION_MAX);
                let counts = total.scaled(off.theta_squared / CONTROL_REGION_MAX);
                BackgroundEstimate::checked(counts, counts.raw / alpha >= SIMPLE_MIN_RAW)
            }
            Model::Histogram => {
                match arange_partition(CONTROL_REGION_MAX, off.theta_squared) {
                    None => BackgroundEstimate::checked(RegionCounts::zero(), false),
                    Some((n_bins, last)) => {
                        let total = count_above(self.table, off.threshold, |t2| t2 <= last);
                        let counts = total.scaled(1.0 / n_bins as f64);
                        BackgroundEstimate::checked(counts, counts.raw / alpha >= HISTOGRAM_MIN_RAW)
                    }
                }
            }
            Model::Extrapolate(curves) => BackgroundEstimate {
                counts: curves.eval(off.threshold, off.theta_squared),
                statistics: Statistics::Sufficient,
            },
        };
        Ok(estimate)
    }
}

/// Weighted and raw count of events above `threshold` whose theta² passes `region`.
fn count_above(table: &EventTable, threshold: f64, region: impl Fn(f64) -> bool) -> RegionCounts {
    let mut weighted = 0.0;
    let mut raw = 0usize;
    for ((&t2, &s), &w) in table.theta_squared().iter().zip(table.scores()).zip(table.weights()) {
        if region(t2) && s >= threshold {
            weighted += w;
            raw += 1;
        }
    }
    RegionCounts::new(weighted, raw as f64)
}

/// Bin count and last edge of the edges `0, step, 2·step, …` strictly below `stop`.
///
/// `None` when fewer than two edges exist.
fn arange_partition(stop: f64, step: f64) -> Option<(usize, f64)> {
    if !step.is_finite() || step <= 0.0 {
        return None;
    }
    // Saturating float-to-int cast.
    let n_edges = (stop / step).ceil().max(0.0) as usize;
    if n_edges < 2 {
        return None;
    }
    let n_bins = n_edges - 1;
    Some((n_bins, n_bins as f64 * step))
}

/// Smoothed survival curves of the background score distribution.
#[derive(Debug, Clone)]
struct SurvivalCurves {
    weighted: LinearInterpolator,
    raw: LinearInterpolator,
}

impl SurvivalCurves {
    fn build(table: &EventTable, sigma: f64) -> Result<Self> {
        let mut scores = Vec::new();
        let mut weights = Vec::new();
        for ((&t2, &s), &w) in table.theta_squared().iter().zip(table.scores()).zip(table.weights())
        {
            if t2 < EXTRAPOLATION_REGION_MAX {
                scores.push(s);
                weights.push(w);
            }
        }

        let edges = uniform_edges(0.0, 1.0, EXTRAPOLATION_SCORE_BINS);
        let nodes: Vec<f64> = edges
            .windows(2)
            .map(|e| {
                let width = e[1] - e[0];
                0.5 * (e[0] + e[1]) + width
            })
            .collect();

        let survival = |h: Vec<f64>| -> Vec<f64> {
            let smoothed = gaussian_filter1d(&h, sigma);
            let total: f64 = smoothed.iter().sum();
            let mut acc = 0.0;
            smoothed
                .iter()
                .map(|&v| {
                    acc += v;
                    total - acc
                })
                .collect()
        };

        let weighted = survival(histogram(&scores, Some(&weights), &edges));
        let raw = survival(histogram(&scores, None, &edges));
        Ok(Self {
            weighted: LinearInterpolator::new(nodes.clone(), weighted)?,
            raw: LinearInterpolator::new(nodes, raw)?,
        })
    }

    fn eval(&self, threshold: f64, region_size: f64) -> RegionCounts {
        if threshold > 1.0 {
            return RegionCounts::zero();
        }
        RegionCounts::new(
            self.weighted.eval(threshold) * region_size,
            self.raw.eval(threshold) * region_size,
        )
    }
}
