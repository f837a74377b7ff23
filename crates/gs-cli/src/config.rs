//! Analysis configuration file (`--config`).

use anyhow::Result;
use gs_events::{EnergyBinning, McProduction, Spacing, Spectrum};
use gs_inference::SensitivityConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a `sensitivity` run needs besides the input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cut search, background strategy, scaler and seed.
    pub sensitivity: SensitivityConfig,
    /// Energy binning.
    pub binning: BinningConfig,
    /// Assumed observation.
    pub observation: ObservationConfig,
    /// Minimum number of triggered telescopes; applied only above 2.
    pub multiplicity: u32,
    /// Simulated productions, used to weight files without a `weight` column.
    pub production: Productions,
    /// Physical spectra the productions are weighted to.
    pub target: TargetSpectra,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sensitivity: SensitivityConfig::default(),
            binning: BinningConfig::default(),
            observation: ObservationConfig::default(),
            multiplicity: 2,
            production: Productions::default(),
            target: TargetSpectra::default(),
        }
    }
}

/// Energy binning section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Lower edge (TeV)
    pub e_min: f64,
    /// Upper edge (TeV)
    pub e_max: f64,
    /// Number of bins
    pub n_bins: usize,
    /// Log or linear edges; also decides the reported bin centers
    pub spacing: Spacing,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self { e_min: 0.02, e_max: 200.0, n_bins: 20, spacing: Spacing::Log }
    }
}

impl BinningConfig {
    /// Validated bin edges.
    pub fn build(&self) -> Result<EnergyBinning> {
        Ok(EnergyBinning::new(self.e_min, self.e_max, self.n_bins, self.spacing)?)
    }
}

/// Observation section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationConfig {
    /// Observation time (hours)
    pub t_obs_hours: f64,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self { t_obs_hours: 50.0 }
    }
}

/// Per-species simulated productions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Productions {
    /// Gamma production; must be point-like
    pub gamma: Option<McProduction>,
    /// Proton production
    pub proton: Option<McProduction>,
    /// Electron production
    pub electron: Option<McProduction>,
}

/// Per-species target spectra.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpectra {
    /// Source spectrum; also the reference for absolute sensitivities.
    pub gamma: Spectrum,
    /// Cosmic-ray proton spectrum
    pub proton: Spectrum,
    /// Cosmic-ray electron spectrum
    pub electron: Spectrum,
}

impl Default for TargetSpectra {
    fn default() -> Self {
        Self {
            gamma: Spectrum::crab(),
            proton: Spectrum::cosmic_proton(),
            electron: Spectrum::cta_electron(),
        }
    }
}

/// Read an [`AnalysisConfig`]; `.json` files are JSON, anything else YAML.
pub fn read_analysis_config(path: &Path) -> Result<AnalysisConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: AnalysisConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_inference::BackgroundStrategy;

    #[test]
    fn test_defaults_match_reference_analysis() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.multiplicity, 2);
        assert_eq!(cfg.binning.n_bins, 20);
        assert_eq!(cfg.observation.t_obs_hours, 50.0);
        assert_eq!(cfg.sensitivity.strategy, BackgroundStrategy::Extrapolate { sigma: 1.0 });
        assert_eq!(cfg.target.gamma, Spectrum::crab());
        assert_eq!(cfg.binning.build().unwrap().n_bins(), 20);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
sensitivity:
  alpha: 0.25
  strategy:
    method: histogram
  seed: 5
binning:
  n_bins: 4
  spacing: linear
multiplicity: 4
production:
  gamma:
    e_min: 0.003
    e_max: 330.0
    spectral_index: -2.0
    n_showers: 1.0e6
    scatter_radius_m: 2500.0
"#;
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(cfg.sensitivity.alpha, 0.25);
        assert_eq!(cfg.sensitivity.strategy, BackgroundStrategy::Histogram);
        assert_eq!(cfg.sensitivity.seed, Some(5));
        assert_eq!(cfg.sensitivity.scaler.n_trials, 200);
        assert_eq!(cfg.binning.n_bins, 4);
        assert_eq!(cfg.binning.e_max, 200.0);
        assert_eq!(cfg.binning.spacing, Spacing::Linear);
        assert_eq!(cfg.target.proton, Spectrum::cosmic_proton());
        assert_eq!(cfg.multiplicity, 4);
        let gamma = cfg.production.gamma.unwrap();
        assert!(!gamma.is_diffuse());
        assert!(cfg.production.proton.is_none());
    }
}
