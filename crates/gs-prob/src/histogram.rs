//! Fixed-edge histograms.

/// `n_bins + 1` evenly spaced edges over `[lo, hi]`; the last edge is exactly `hi`.
pub fn uniform_edges(lo: f64, hi: f64, n_bins: usize) -> Vec<f64> {
    if n_bins == 0 {
        return vec![lo];
    }
    let step = (hi - lo) / n_bins as f64;
    let mut edges: Vec<f64> = (0..=n_bins).map(|i| lo + i as f64 * step).collect();
    edges[n_bins] = hi;
    edges
}

/// Histogram `values` over `edges`, optionally weighted.
///
/// Bins are `[e_i, e_{i+1})` except the last one, which also includes its right edge.
/// Values outside `[e_0, e_n]` (and NaNs) are ignored. Fewer than two edges give an
/// empty histogram.
pub fn histogram(values: &[f64], weights: Option<&[f64]>, edges: &[f64]) -> Vec<f64> {
    let n_bins = edges.len().saturating_sub(1);
    let mut counts = vec![0.0; n_bins];
    if n_bins == 0 {
        return counts;
    }
    let (first, last) = (edges[0], edges[n_bins]);
    for (i, &v) in values.iter().enumerate() {
        if !(v >= first && v <= last) {
            continue;
        }
        let bin = if v == last { n_bins - 1 } else { edges.partition_point(|&e| e <= v) - 1 };
        counts[bin] += weights.map_or(1.0, |w| w[i]);
    }
    counts
}
