use serde::Serialize;

/// Half-width of the fit window in units of the current σ.
pub const TRUNCATION_SIGMAS: f64 = 2.5;

/// Ratio of the RMS of a normal distribution truncated at ±2.5σ to its σ.
const TRUNCATED_RMS_RATIO: f64 = 0.954_598;

const MAX_ITERATIONS: usize = 20;

/// Core Gaussian estimate of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GaussianWidth {
    pub mean: f64,
    pub sigma: f64,
    pub sigma_error: f64,
    /// Samples inside the final window.
    pub entries: usize,
}

/// Estimates mean and σ of the Gaussian core of `samples`.
///
/// Starts from the plain mean and RMS, then repeatedly recomputes them over
/// the samples within ±2.5σ of the mean, correcting the RMS for the
/// truncation, until the window stops changing. Tails beyond the window do
/// not inflate σ. `None` for fewer than two finite samples or zero spread.
pub fn fit_gaussian_width(samples: &[f64]) -> Option<GaussianWidth> {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    let (mut mean, mut rms, mut n) = moments(finite.iter().copied())?;
    let mut sigma = rms;
    for _ in 0..MAX_ITERATIONS {
        let lo = mean - TRUNCATION_SIGMAS * sigma;
        let hi = mean + TRUNCATION_SIGMAS * sigma;
        let (m, r, count) = moments(finite.iter().copied().filter(|v| (lo..=hi).contains(v)))?;
        let settled = count == n && (m - mean).abs() <= 1e-12 * sigma.max(1.0);
        mean = m;
        rms = r;
        n = count;
        sigma = rms / TRUNCATED_RMS_RATIO;
        if settled {
            break;
        }
    }
    if sigma.is_nan() || sigma <= 0.0 {
        return None;
    }
    Some(GaussianWidth {
        mean,
        sigma,
        sigma_error: sigma / (2.0 * n as f64).sqrt(),
        entries: n,
    })
}

fn moments(values: impl Iterator<Item = f64>) -> Option<(f64, f64, usize)> {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n < 2 {
        return None;
    }
    let mean = sum / n as f64;
    let var = (sum_sq / n as f64 - mean * mean).max(0.0);
    Some((mean, var.sqrt(), n))
}
