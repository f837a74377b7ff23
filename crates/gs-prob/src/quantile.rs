//! Quantiles over Monte-Carlo trial results.

/// Quantile for sorted data via linear interpolation.
///
/// - `q=0` returns min
/// - `q=1` returns max
/// - empty input returns `NaN`
pub fn quantile_linear_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let i = pos.floor() as usize;
    let j = pos.ceil() as usize;
    if i == j {
        return sorted[i];
    }
    let t = pos - i as f64;
    (1.0 - t) * sorted[i] + t * sorted[j]
}

/// Percentiles (0..=100) of the non-`NaN` entries of `data`.
///
/// Missing entries are skipped; if nothing remains every percentile is `NaN`.
pub fn nan_percentiles<const N: usize>(data: &[f64], percentiles: [f64; N]) -> [f64; N] {
    let mut valid: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    valid.sort_by(f64::total_cmp);
    percentiles.map(|p| quantile_linear_sorted(&valid, p / 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_linear_sorted_edges() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((quantile_linear_sorted(&s, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile_linear_sorted(&s, 1.0) - 5.0).abs() < 1e-12);
        assert!((quantile_linear_sorted(&s, 0.5) - 3.0).abs() < 1e-12);
        assert!((quantile_linear_sorted(&s, 0.25) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn nan_percentiles_unsorted_input() {
        let xs = [5.0, 1.0, 4.0, 2.0, 3.0];
        let [median] = nan_percentiles(&xs, [50.0]);
        assert!((median - 3.0).abs() < 1e-12);
        assert!(quantile_linear_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn nan_percentiles_skip_missing() {
        let xs = [f64::NAN, 1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0];
        let [median, lo, hi] = nan_percentiles(&xs, [50.0, 5.0, 95.0]);
        assert!((median - 3.0).abs() < 1e-12);
        assert!((lo - 1.2).abs() < 1e-12);
        assert!((hi - 4.8).abs() < 1e-12);
    }

    #[test]
    fn nan_percentiles_all_missing() {
        let xs = [f64::NAN; 4];
        let out = nan_percentiles(&xs, [50.0, 5.0, 95.0]);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
