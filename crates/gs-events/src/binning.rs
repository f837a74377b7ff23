//! Energy binning.

use gs_core::{EnergyBin, Error, Result};
use serde::{Deserialize, Serialize};

/// Spacing of bin edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// Edges equidistant in `log10(E)`; centers are geometric means.
    #[default]
    Log,
    /// Edges equidistant in `E`; centers are arithmetic means.
    Linear,
}

/// Ordered, contiguous energy bins covering `[e_min, e_max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyBinning {
    edges: Vec<f64>,
    spacing: Spacing,
}

impl EnergyBinning {
    /// `n_bins` bins between `e_min` and `e_max` (TeV).
    pub fn new(e_min: f64, e_max: f64, n_bins: usize, spacing: Spacing) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Config("energy binning requires at least one bin".into()));
        }
        if !(e_min.is_finite() && e_max.is_finite() && e_min < e_max) {
            return Err(Error::Config(format!(
                "energy range must satisfy e_min < e_max, got ({e_min}, {e_max})"
            )));
        }
        if spacing == Spacing::Log && e_min <= 0.0 {
            return Err(Error::Config(format!(
                "log-spaced energy bins require e_min > 0, got {e_min}"
            )));
        }

        let edges = match spacing {
            Spacing::Log => {
                let (lo, hi) = (e_min.log10(), e_max.log10());
                (0..=n_bins)
                    .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / n_bins as f64))
                    .collect::<Vec<_>>()
            }
            Spacing::Linear => (0..=n_bins)
                .map(|i| e_min + (e_max - e_min) * i as f64 / n_bins as f64)
                .collect(),
        };
        let mut edges = edges;
        // Pin the outer edges so the range is covered exactly.
        edges[0] = e_min;
        edges[n_bins] = e_max;
        Ok(Self { edges, spacing })
    }

    /// Binning from explicit edges (strictly increasing, at least two).
    pub fn from_edges(edges: Vec<f64>, spacing: Spacing) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Config("energy binning requires at least two edges".into()));
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Config("energy bin edges must be finite and increasing".into()));
        }
        Ok(Self { edges, spacing })
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin edges (`n_bins + 1` values).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin centers.
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|w| match self.spacing {
                Spacing::Log => (w[0] * w[1]).sqrt(),
                Spacing::Linear => 0.5 * (w[0] + w[1]),
            })
            .collect()
    }

    /// Bin widths.
    pub fn widths(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Bins in ascending order.
    pub fn bins(&self) -> Vec<EnergyBin> {
        self.edges.windows(2).map(|w| EnergyBin::new(w[0], w[1])).collect()
    }
}
