//! Gaussian smoothing for 1-D histograms.

/// Kernel half-width in units of `sigma`.
pub const DEFAULT_TRUNCATE: f64 = 4.0;

/// Convolve `input` with a normalized Gaussian kernel of width `sigma` (in bins).
///
/// Borders use half-sample symmetric reflection (`d c b a | a b c d | d c b a`), so the
/// total content of a histogram is preserved. The kernel is cut at
/// `round(DEFAULT_TRUNCATE * sigma)` bins. A `sigma` of (numerically) zero returns the
/// input unchanged.
pub fn gaussian_filter1d(input: &[f64], sigma: f64) -> Vec<f64> {
    let n = input.len();
    if n == 0 || !(sigma > 1e-15) {
        return input.to_vec();
    }

    let radius = (DEFAULT_TRUNCATE * sigma + 0.5) as usize;
    let kernel = gaussian_kernel(sigma, radius);

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let offset = i as isize + k as isize - radius as isize;
                    w * input[reflect_index(offset, n)]
                })
                .sum()
        })
        .collect()
}

fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let inv_two_var = 0.5 / (sigma * sigma);
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|k| {
            let x = k as f64 - radius as f64;
            (-x * x * inv_two_var).exp()
        })
        .collect();
    let norm: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= norm;
    }
    kernel
}

#[inline]
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n { m } else { 2 * n - 1 - m }
}
