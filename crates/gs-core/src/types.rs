//! Common data types for gammasens

use serde::{Deserialize, Serialize};

/// A pair of selection cuts defining the on-region of an event table.
///
/// Events pass when `theta² <= theta_squared` and `score >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutPair {
    /// Containment radius squared (deg²)
    pub theta_squared: f64,
    /// Classification-score threshold
    pub threshold: f64,
}

impl CutPair {
    /// Create a new cut pair
    pub fn new(theta_squared: f64, threshold: f64) -> Self {
        Self { theta_squared, threshold }
    }

    /// Containment radius in degrees.
    pub fn theta(&self) -> f64 {
        self.theta_squared.sqrt()
    }

    /// Same threshold, region size divided by `alpha`.
    ///
    /// Background is always counted in the region that is `1/alpha` times larger
    /// than the signal region.
    pub fn off_region(&self, alpha: f64) -> Self {
        Self { theta_squared: self.theta_squared / alpha, threshold: self.threshold }
    }
}

/// Counts in a selection region.
///
/// `weighted` is the physically scaled expected number of events; `raw` is the
/// number of simulated events behind it and only judges statistical power.
/// `raw` is fractional when it comes from a smoothed or interpolated estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionCounts {
    /// Sum of per-event weights
    pub weighted: f64,
    /// Unweighted sample size (or its proxy)
    pub raw: f64,
}

impl RegionCounts {
    /// Create region counts
    pub fn new(weighted: f64, raw: f64) -> Self {
        Self { weighted, raw }
    }

    /// Empty region.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Multiply both counts by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self { weighted: self.weighted * factor, raw: self.raw * factor }
    }

    /// Weight carried by one raw event (`weighted / raw`), `0` for an empty region.
    pub fn weight_per_event(&self) -> f64 {
        if self.raw > 0.0 { self.weighted / self.raw } else { 0.0 }
    }
}

/// Half-open energy interval `[low, high)` in TeV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBin {
    /// Lower edge (inclusive)
    pub low: f64,
    /// Upper edge (exclusive)
    pub high: f64,
}

impl EnergyBin {
    /// Create an energy bin
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether `energy` falls into `[low, high)`.
    #[inline]
    pub fn contains(&self, energy: f64) -> bool {
        energy >= self.low && energy < self.high
    }

    /// Geometric bin center.
    pub fn log_center(&self) -> f64 {
        (self.low * self.high).sqrt()
    }

    /// Bin width.
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Flux scaling factor needed for a detection, with its Monte-Carlo spread.
///
/// All three values are `NaN` when no trial produced a finite factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingEstimate {
    /// 50th percentile of valid trials
    #[serde(with = "nan_as_null")]
    pub median: f64,
    /// 5th percentile of valid trials
    #[serde(with = "nan_as_null")]
    pub low: f64,
    /// 95th percentile of valid trials
    #[serde(with = "nan_as_null")]
    pub high: f64,
    /// Trials that produced a finite scaling factor
    pub n_valid: usize,
    /// Trials attempted
    pub n_trials: usize,
}

impl ScalingEstimate {
    /// Estimate with no valid trial.
    pub fn undefined(n_trials: usize) -> Self {
        Self { median: f64::NAN, low: f64::NAN, high: f64::NAN, n_valid: 0, n_trials }
    }

    /// `false` when every trial was missing.
    pub fn is_defined(&self) -> bool {
        self.n_valid > 0 && self.median.is_finite()
    }
}

/// Absolute sensitivity `E² · F` (erg cm⁻² s⁻¹) at the bin center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxSensitivity {
    /// Reference spectrum E²·F scaled by the median factor
    #[serde(with = "nan_as_null")]
    pub median: f64,
    /// Scaled by the 5th percentile factor
    #[serde(with = "nan_as_null")]
    pub low: f64,
    /// Scaled by the 95th percentile factor
    #[serde(with = "nan_as_null")]
    pub high: f64,
}

/// Outcome for one energy bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinResult {
    /// Energy interval
    pub bin: EnergyBin,
    /// Cuts chosen by the optimizer
    pub cut: CutPair,
    /// Li & Ma significance at the chosen cut (0 when every candidate was rejected)
    pub significance: f64,
    /// Signal counts in the on-region
    pub signal: RegionCounts,
    /// Background counts normalized to the off-region
    pub background: RegionCounts,
    /// Relative sensitivity (flux scaling factor)
    pub scaling: ScalingEstimate,
    /// Absolute sensitivity, when a reference spectrum was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flux: Option<FluxSensitivity>,
}

impl BinResult {
    /// Containment radius (deg) of the chosen cut.
    pub fn theta(&self) -> f64 {
        self.cut.theta()
    }
}

/// Per-bin results in bin order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    /// One row per energy bin
    pub rows: Vec<BinResult>,
}

impl SensitivityTable {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bins whose scaling factor is undefined.
    pub fn undefined_bins(&self) -> impl Iterator<Item = &BinResult> {
        self.rows.iter().filter(|r| !r.scaling.is_defined())
    }
}

/// JSON has no NaN; undefined values travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() { s.serialize_some(v) } else { s.serialize_none() }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_bin_half_open() {
        let bin = EnergyBin::new(1.0, 10.0);
        assert!(bin.contains(1.0));
        assert!(bin.contains(9.999));
        assert!(!bin.contains(10.0));
        assert_relative_eq!(bin.log_center(), 10f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_off_region_scales_theta_squared_only() {
        let cut = CutPair::new(0.03, 0.8);
        let off = cut.off_region(0.2);
        assert_relative_eq!(off.theta_squared, 0.15, epsilon = 1e-12);
        assert_eq!(off.threshold, 0.8);
    }

    #[test]
    fn test_weight_per_event_empty_region() {
        assert_eq!(RegionCounts::zero().weight_per_event(), 0.0);
        assert_relative_eq!(RegionCounts::new(5.0, 10.0).weight_per_event(), 0.5);
    }

    #[test]
    fn test_undefined_scaling_roundtrips_through_json() {
        let est = ScalingEstimate::undefined(200);
        let json = serde_json::to_string(&est).unwrap();
        assert!(json.contains("\"median\":null"), "{json}");
        let back: ScalingEstimate = serde_json::from_str(&json).unwrap();
        assert!(back.median.is_nan());
        assert!(!back.is_defined());
        assert_eq!(back.n_trials, 200);
    }
}
