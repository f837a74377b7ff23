//! Angular offsets between reconstructed and source directions.

use gs_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Horizontal-frame direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    /// Altitude (deg)
    pub alt: f64,
    /// Azimuth (deg)
    pub az: f64,
}

impl SkyPosition {
    /// Create a position
    pub fn new(alt: f64, az: f64) -> Self {
        Self { alt, az }
    }
}

/// Great-circle distance (deg) between two horizontal-frame directions.
///
/// Uses the Vincenty form, which stays accurate for both tiny and antipodal separations.
pub fn angular_separation_deg(a: SkyPosition, b: SkyPosition) -> f64 {
    let (lat1, lat2) = (a.alt.to_radians(), b.alt.to_radians());
    let dlon = (b.az - a.az).to_radians();

    let (s1, c1) = lat1.sin_cos();
    let (s2, c2) = lat2.sin_cos();
    let (sd, cd) = dlon.sin_cos();

    let num1 = c2 * sd;
    let num2 = c1 * s2 - s1 * c2 * cd;
    let denom = s1 * s2 + c1 * c2 * cd;
    num1.hypot(num2).atan2(denom).to_degrees()
}

/// Offsets (deg) of reconstructed directions `(alt[i], az[i])` from `source`.
pub fn offsets_from_source(alt: &[f64], az: &[f64], source: SkyPosition) -> Result<Vec<f64>> {
    if alt.len() != az.len() {
        return Err(Error::Schema(format!(
            "alt/az length mismatch: {} != {}",
            alt.len(),
            az.len()
        )));
    }
    Ok(alt
        .iter()
        .zip(az)
        .map(|(&alt, &az)| angular_separation_deg(SkyPosition::new(alt, az), source))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_point_is_zero() {
        let p = SkyPosition::new(70.0, 180.0);
        assert_relative_eq!(angular_separation_deg(p, p), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_offsets_along_meridian() {
        let src = SkyPosition::new(70.0, 0.0);
        let d = angular_separation_deg(SkyPosition::new(70.5, 0.0), src);
        assert_relative_eq!(d, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_azimuth_offset_shrinks_with_altitude() {
        // One degree in azimuth at altitude 60 is roughly cos(60) = 0.5 degrees on the sky.
        let d = angular_separation_deg(SkyPosition::new(60.0, 10.0), SkyPosition::new(60.0, 11.0));
        assert!((d - 0.5).abs() < 1e-3, "d={d}");
        // Zenith: azimuth is degenerate.
        let z = angular_separation_deg(SkyPosition::new(90.0, 0.0), SkyPosition::new(90.0, 123.0));
        assert_relative_eq!(z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_offsets_from_source_length_check() {
        let src = SkyPosition::new(70.0, 0.0);
        assert!(offsets_from_source(&[70.0], &[0.0, 1.0], src).is_err());
        let o = offsets_from_source(&[70.0, 71.0], &[0.0, 0.0], src).unwrap();
        assert_relative_eq!(o[1], 1.0, epsilon = 1e-10);
    }
}
