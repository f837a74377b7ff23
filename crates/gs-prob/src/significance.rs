//! On/off detection significance.
//!
//! Li & Ma (1983), ApJ 272, 317, eq. 17:
//!
//! `S = sqrt(2) * sqrt( N_on ln[(1+a)/a * N_on/(N_on+N_off)] + N_off ln[(1+a) * N_off/(N_on+N_off)] )`
//!
//! where `a` is the on/off exposure ratio.

/// Li & Ma significance for `n_on` counts in the on-region and `n_off` counts in an
/// off-region with exposure ratio `alpha`.
///
/// Degenerate inputs never fail: any configuration where the formula is undefined
/// (an empty region, non-positive `alpha`, negative counts) yields `0`, and so does
/// a deficit (`n_on < alpha * n_off`).
pub fn li_ma_significance(n_on: f64, n_off: f64, alpha: f64) -> f64 {
    if !(alpha > 0.0) || n_on < alpha * n_off {
        return 0.0;
    }

    let total = n_on + n_off;
    let p_on = n_on / total;
    let p_off = n_off / total;

    let t1 = n_on * (((1.0 + alpha) / alpha) * p_on).ln();
    let t2 = n_off * ((1.0 + alpha) * p_off).ln();
    let s = (2.0 * (t1 + t2)).sqrt();

    if s.is_nan() { 0.0 } else { s }
}
