//! Spectral reweighting of simulated events.
//!
//! Simulations are produced with a power-law spectrum over `[e_min, e_max]`. Each event
//! gets a weight equal to the number of real events it stands for when the sky follows a
//! target [`Spectrum`] during an observation of `t_obs` seconds:
//!
//! `w(E) = F_target(E) · A_gen · Ω_gen · t_obs / (N_sim · pdf_sim(E))`
//!
//! Fluxes are in TeV⁻¹ cm⁻² s⁻¹ (point sources) or TeV⁻¹ cm⁻² s⁻¹ sr⁻¹ (diffuse).

use gs_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 1 TeV in erg.
pub const TEV_TO_ERG: f64 = 1.602_176_634;

/// Differential flux models.
///
/// Plain values: pass them where they are needed, there are no shared instances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Spectrum {
    /// `N · (E/E0)^index`
    PowerLaw {
        /// Flux at `e_ref`
        normalization: f64,
        /// Spectral index (negative for falling spectra)
        index: f64,
        /// Reference energy (TeV)
        e_ref: f64,
    },
    /// `N · (E/E0)^(a + b·log10(E/E0))`
    LogParabola {
        /// Flux at `e_ref`
        normalization: f64,
        /// Index at `e_ref`
        a: f64,
        /// Curvature
        b: f64,
        /// Reference energy (TeV)
        e_ref: f64,
    },
    /// Power law with a log-normal enhancement:
    /// `N · (E/E0)^index · (1 + A · exp(-(log10(E/E0) - mu)² / (2 sigma²)))`
    PowerLawWithBump {
        /// Flux scale at `e_ref`
        normalization: f64,
        /// Spectral index
        index: f64,
        /// Reference energy (TeV)
        e_ref: f64,
        /// Bump amplitude `A`
        amplitude: f64,
        /// Bump center in `log10(E/E0)`
        mu: f64,
        /// Bump width in decades
        sigma: f64,
    },
}

impl Spectrum {
    /// Crab Nebula log-parabola (MAGIC, JHEAp 2015).
    pub fn crab() -> Self {
        Spectrum::LogParabola { normalization: 3.23e-11, a: -2.47, b: -0.24, e_ref: 1.0 }
    }

    /// Cosmic-ray protons (per sr).
    pub fn cosmic_proton() -> Self {
        Spectrum::PowerLaw { normalization: 9.6e-6, index: -2.7, e_ref: 1.0 }
    }

    /// Cosmic-ray electrons (per sr).
    pub fn cta_electron() -> Self {
        Spectrum::PowerLawWithBump {
            normalization: 2.385e-9,
            index: -3.43,
            e_ref: 1.0,
            amplitude: 1.95,
            mu: -0.101,
            sigma: 0.741,
        }
    }

    /// Differential flux at `energy` (TeV).
    pub fn flux(&self, energy: f64) -> f64 {
        match *self {
            Spectrum::PowerLaw { normalization, index, e_ref } => {
                normalization * (energy / e_ref).powf(index)
            }
            Spectrum::LogParabola { normalization, a, b, e_ref } => {
                let x = energy / e_ref;
                normalization * x.powf(a + b * x.log10())
            }
            Spectrum::PowerLawWithBump { normalization, index, e_ref, amplitude, mu, sigma } => {
                let x = energy / e_ref;
                let z = (x.log10() - mu) / sigma;
                normalization * x.powf(index) * (1.0 + amplitude * (-0.5 * z * z).exp())
            }
        }
    }

    /// `E² · F(E)` in erg cm⁻² s⁻¹ (sr⁻¹).
    pub fn e2_flux_erg(&self, energy: f64) -> f64 {
        energy * energy * self.flux(energy) * TEV_TO_ERG
    }
}

/// Description of a simulated production.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McProduction {
    /// Lowest simulated energy (TeV)
    pub e_min: f64,
    /// Highest simulated energy (TeV)
    pub e_max: f64,
    /// Simulated spectral index (e.g. `-2.0`)
    pub spectral_index: f64,
    /// Total number of simulated showers (including reuse)
    pub n_showers: f64,
    /// Maximum impact distance (m)
    pub scatter_radius_m: f64,
    /// Half-opening angle of the simulated view cone (deg); `0` for point-like
    #[serde(default)]
    pub viewcone_deg: f64,
}

impl McProduction {
    /// Check the production description.
    pub fn validate(&self) -> Result<()> {
        if !(self.e_min > 0.0 && self.e_max > self.e_min && self.e_max.is_finite()) {
            return Err(Error::Config(format!(
                "production energy range must satisfy 0 < e_min < e_max, got ({}, {})",
                self.e_min, self.e_max
            )));
        }
        if !(self.n_showers > 0.0) || !self.spectral_index.is_finite() {
            return Err(Error::Config(
                "production needs a positive shower count and a finite index".into(),
            ));
        }
        if !(self.scatter_radius_m > 0.0) {
            return Err(Error::Config(format!(
                "scatter radius must be positive, got {}",
                self.scatter_radius_m
            )));
        }
        if !(0.0..180.0).contains(&self.viewcone_deg) {
            return Err(Error::Config(format!(
                "view cone must lie in [0, 180) deg, got {}",
                self.viewcone_deg
            )));
        }
        Ok(())
    }

    /// Whether showers were thrown over a view cone rather than from one direction.
    pub fn is_diffuse(&self) -> bool {
        self.viewcone_deg > 0.0
    }

    /// Generation area (cm²).
    pub fn generation_area_cm2(&self) -> f64 {
        PI * self.scatter_radius_m * self.scatter_radius_m * 1e4
    }

    /// Solid angle of the view cone (sr); `1` for point-like productions so that
    /// point-source fluxes pass through unchanged.
    pub fn solid_angle_sr(&self) -> f64 {
        if self.is_diffuse() {
            2.0 * PI * (1.0 - self.viewcone_deg.to_radians().cos())
        } else {
            1.0
        }
    }

    /// Simulated showers per TeV at `energy`.
    pub fn generated_density(&self, energy: f64) -> f64 {
        if !(energy >= self.e_min && energy <= self.e_max) {
            return 0.0;
        }
        let g = self.spectral_index;
        let integral = if (g + 1.0).abs() < 1e-12 {
            (self.e_max / self.e_min).ln()
        } else {
            (self.e_max.powf(g + 1.0) - self.e_min.powf(g + 1.0)) / (g + 1.0)
        };
        self.n_showers * energy.powf(g) / integral
    }

    /// Per-event weights mapping this production onto `target` for `t_obs_s` seconds.
    ///
    /// Events outside the simulated range get weight `0`.
    pub fn reweigh_to(&self, target: &Spectrum, energies: &[f64], t_obs_s: f64) -> Result<Vec<f64>> {
        self.validate()?;
        if !(t_obs_s > 0.0 && t_obs_s.is_finite()) {
            return Err(Error::Config(format!("observation time must be positive, got {t_obs_s}")));
        }
        let exposure = self.generation_area_cm2() * self.solid_angle_sr() * t_obs_s;
        Ok(energies
            .iter()
            .map(|&e| {
                let density = self.generated_density(e);
                if density > 0.0 { target.flux(e) * exposure / density } else { 0.0 }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn production(index: f64) -> McProduction {
        McProduction {
            e_min: 0.003,
            e_max: 330.0,
            spectral_index: index,
            n_showers: 1e7,
            scatter_radius_m: 2500.0,
            viewcone_deg: 0.0,
        }
    }

    #[test]
    fn test_crab_normalization_at_1tev() {
        assert_relative_eq!(Spectrum::crab().flux(1.0), 3.23e-11, max_relative = 1e-12);
        // Curvature steepens the spectrum above the reference energy.
        let c = Spectrum::crab();
        let local_index = (c.flux(10.0) / c.flux(1.0)).log10();
        assert!(local_index < -2.47, "{local_index}");
    }

    #[test]
    fn test_generated_density_integrates_to_n_showers() {
        for index in [-2.0, -1.0] {
            let p = production(index);
            // Log-spaced trapezoid over the simulated range.
            let n = 20_000;
            let (lo, hi) = (p.e_min.ln(), p.e_max.ln());
            let mut total = 0.0;
            for i in 0..n {
                let a = (lo + (hi - lo) * i as f64 / n as f64).exp();
                let b = (lo + (hi - lo) * (i + 1) as f64 / n as f64).exp();
                total += 0.5 * (p.generated_density(a) + p.generated_density(b)) * (b - a);
            }
            assert_relative_eq!(total, p.n_showers, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_reweigh_matches_target_expectation() {
        // Summing weights of a perfectly sampled production reproduces the expected counts:
        // weight density = generated density * w(E) = F(E) * A * t.
        let p = production(-2.0);
        let target = Spectrum::PowerLaw { normalization: 1e-12, index: -2.0, e_ref: 1.0 };
        let w = p.reweigh_to(&target, &[1.0, 10.0], 3600.0).unwrap();
        let expected = target.flux(1.0) * p.generation_area_cm2() * 3600.0 / p.generated_density(1.0);
        assert_relative_eq!(w[0], expected, max_relative = 1e-12);
        // Same index as the production: weights are energy independent.
        assert_relative_eq!(w[0], w[1], max_relative = 1e-9);
    }

    #[test]
    fn test_out_of_range_energy_has_zero_weight() {
        let p = production(-2.0);
        let w = p.reweigh_to(&Spectrum::crab(), &[1000.0], 3600.0).unwrap();
        assert_eq!(w, vec![0.0]);
    }

    #[test]
    fn test_invalid_production() {
        let mut p = production(-2.0);
        p.e_max = p.e_min;
        assert!(matches!(p.validate(), Err(Error::Config(_))));
        let p = production(-2.0);
        assert!(p.reweigh_to(&Spectrum::crab(), &[1.0], 0.0).is_err());
    }

    #[test]
    fn test_diffuse_solid_angle() {
        let mut p = production(-2.0);
        p.viewcone_deg = 10.0;
        assert!(p.is_diffuse());
        let expected = 2.0 * PI * (1.0 - 10f64.to_radians().cos());
        assert_relative_eq!(p.solid_angle_sr(), expected, max_relative = 1e-12);
    }
}
