//! Monte-Carlo flux scaling.
//!
//! Given the signal and background at the chosen cut, find the factor by which the
//! signal flux must be multiplied to reach the target significance. The raw counts are
//! Poisson-resampled `n_trials` times and each trial is solved with a bounded Brent
//! minimization of `(target − S(x))²` over `[0, upper_bound]`, where
//! `S(x) = LiMa(b·α + s·x, b, α)`.
//!
//! A trial is missing (`NaN`) when its resampled background or signal is zero, or when
//! the minimizer ends on the upper bound. The estimate reports the 50th, 5th and 95th
//! percentiles of the remaining trials.

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::brent::BrentOpt;
use gs_core::{Error, RegionCounts, Result, ScalingEstimate};
use gs_prob::{li_ma_significance, nan_percentiles};
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

const MAX_ITERS: u64 = 500;

/// `np.allclose` defaults.
const SATURATION_RTOL: f64 = 1e-5;
const SATURATION_ATOL: f64 = 1e-8;

/// Scaler settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalerConfig {
    /// Significance a detection must reach.
    pub target_significance: f64,
    /// Monte-Carlo trials per bin.
    pub n_trials: usize,
    /// Largest scaling factor considered.
    pub upper_bound: f64,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self { target_significance: 5.0, n_trials: 200, upper_bound: 100.0 }
    }
}

impl ScalerConfig {
    /// Reject non-positive targets, bounds and trial counts.
    pub fn validate(&self) -> Result<()> {
        if !self.target_significance.is_finite() || self.target_significance <= 0.0 {
            return Err(Error::Config(format!(
                "target_significance must be finite and > 0, got {}",
                self.target_significance
            )));
        }
        if self.n_trials == 0 {
            return Err(Error::Config("n_trials must be >= 1".to_string()));
        }
        if !self.upper_bound.is_finite() || self.upper_bound <= 0.0 {
            return Err(Error::Config(format!(
                "upper_bound must be finite and > 0, got {}",
                self.upper_bound
            )));
        }
        Ok(())
    }
}

/// `(target − S(x))²` for one resampled trial.
struct ScalingObjective {
    signal: f64,
    background: f64,
    alpha: f64,
    target: f64,
}

impl CostFunction for ScalingObjective {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let n_on = self.background * self.alpha + self.signal * x;
        let s = li_ma_significance(n_on, self.background, self.alpha);
        Ok((self.target - s).powi(2))
    }
}

/// Monte-Carlo sensitivity scaler.
#[derive(Debug, Clone, Copy)]
pub struct SensitivityScaler {
    config: ScalerConfig,
    alpha: f64,
}

impl SensitivityScaler {
    /// Create a scaler for exposure ratio `alpha`.
    pub fn new(config: ScalerConfig, alpha: f64) -> Result<Self> {
        config.validate()?;
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(Error::Config(format!("alpha must be finite and > 0, got {alpha}")));
        }
        Ok(Self { config, alpha })
    }

    /// Settings.
    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    /// Scaling factor for one (already resampled) pair of weighted counts, `NaN` if the
    /// trial is missing.
    pub fn solve(&self, signal: f64, background: f64) -> Result<f64> {
        if background == 0.0 || signal == 0.0 || !signal.is_finite() || !background.is_finite() {
            return Ok(f64::NAN);
        }
        let upper = self.config.upper_bound;
        let problem = ScalingObjective {
            signal,
            background,
            alpha: self.alpha,
            target: self.config.target_significance,
        };
        let solver = BrentOpt::new(0.0, upper);
        let res = Executor::new(problem, solver)
            .configure(|state| state.max_iters(MAX_ITERS))
            .run()
            .map_err(|e| Error::Computation(format!("scaling factor minimization failed: {e}")))?;

        let x = *res
            .state()
            .get_best_param()
            .ok_or_else(|| Error::Computation("minimizer returned no best point".to_string()))?;

        if (x - upper).abs() <= SATURATION_ATOL + SATURATION_RTOL * upper.abs() {
            return Ok(f64::NAN);
        }
        Ok(x)
    }

    /// Resample `signal` and `background` and aggregate the per-trial scaling factors.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        signal: RegionCounts,
        background: RegionCounts,
        rng: &mut R,
    ) -> Result<ScalingEstimate> {
        let n = self.config.n_trials;
        let signals = (0..n).map(|_| resample(rng, signal)).collect::<Result<Vec<_>>>()?;
        let backgrounds = (0..n).map(|_| resample(rng, background)).collect::<Result<Vec<_>>>()?;

        let trials = signals
            .iter()
            .zip(&backgrounds)
            .map(|(&s, &b)| self.solve(s, b))
            .collect::<Result<Vec<_>>>()?;

        let n_valid = trials.iter().filter(|v| !v.is_nan()).count();
        if n_valid == 0 {
            return Ok(ScalingEstimate::undefined(n));
        }
        let [median, low, high] = nan_percentiles(&trials, [50.0, 5.0, 95.0]);
        Ok(ScalingEstimate { median, low, high, n_valid, n_trials: n })
    }
}

/// Poisson draw with mean `counts.raw`, rescaled to the weighted count.
///
/// Means that are zero, negative or non-finite draw 0.
fn resample<R: Rng + ?Sized>(rng: &mut R, counts: RegionCounts) -> Result<f64> {
    let mean = counts.raw;
    if !mean.is_finite() || mean <= 0.0 {
        return Ok(0.0);
    }
    let pois = Poisson::new(mean)
        .map_err(|e| Error::Computation(format!("invalid Poisson mean {mean}: {e}")))?;
    let k: f64 = pois.sample(rng);
    Ok(if k == 0.0 { 0.0 } else { k * counts.weight_per_event() })
}
