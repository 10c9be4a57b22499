use super::gaussian::{fit_gaussian_width, GaussianWidth};
use serde::{Deserialize, Serialize};

/// Uniform binning of `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Binning {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self { bins, min, max }
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    pub fn index(&self, x: f64) -> Option<usize> {
        if self.bins == 0 || !(self.min..self.max).contains(&x) {
            return None;
        }
        let idx = ((x - self.min) / self.width()) as usize;
        Some(idx.min(self.bins - 1))
    }

    pub fn center(&self, idx: usize) -> f64 {
        self.min + (idx as f64 + 0.5) * self.width()
    }
}

/// Gaussian width of one x slice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SliceWidth {
    pub x: f64,
    #[serde(flatten)]
    pub width: GaussianWidth,
}

/// Per-slice widths of y as a function of x.
#[derive(Clone, Debug, Serialize)]
pub struct SliceProfile {
    pub binning: Binning,
    pub slices: Vec<SliceWidth>,
}

impl SliceProfile {
    /// Default minimum number of entries for a slice to be fitted.
    pub const MIN_ENTRIES: usize = 50;

    /// Bins `(x, y)` pairs in x and fits every slice holding more than
    /// `min_entries` samples. Pairs outside the binning are dropped.
    pub fn build(samples: &[(f64, f64)], binning: Binning, min_entries: usize) -> Self {
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); binning.bins];
        for &(x, y) in samples {
            if let Some(idx) = binning.index(x) {
                if y.is_finite() {
                    columns[idx].push(y);
                }
            }
        }
        let slices = columns
            .iter()
            .enumerate()
            .filter(|(_, ys)| ys.len() > min_entries)
            .filter_map(|(idx, ys)| {
                fit_gaussian_width(ys).map(|width| SliceWidth {
                    x: binning.center(idx),
                    width,
                })
            })
            .collect();
        Self { binning, slices }
    }

    /// `(x, σ, σ error)` points for a straight-line fit.
    pub fn sigma_points(&self) -> Vec<(f64, f64, f64)> {
        self.slices
            .iter()
            .map(|s| (s.x, s.width.sigma, s.width.sigma_error))
            .collect()
    }
}

/// Mean of y in one x slice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SliceMean {
    pub x: f64,
    pub mean: f64,
    pub mean_error: f64,
    pub entries: usize,
}

/// Per-slice means of y as a function of x.
#[derive(Clone, Debug, Serialize)]
pub struct MeanProfile {
    pub binning: Binning,
    pub slices: Vec<SliceMean>,
}

impl MeanProfile {
    /// Slices with fewer than two finite entries are left out.
    pub fn build(samples: &[(f64, f64)], binning: Binning) -> Self {
        let mut sums = vec![(0usize, 0.0f64, 0.0f64); binning.bins];
        for &(x, y) in samples {
            if let (Some(idx), true) = (binning.index(x), y.is_finite()) {
                let (n, sum, sum_sq) = &mut sums[idx];
                *n += 1;
                *sum += y;
                *sum_sq += y * y;
            }
        }
        let slices = sums
            .iter()
            .enumerate()
            .filter(|(_, (n, _, _))| *n >= 2)
            .map(|(idx, &(n, sum, sum_sq))| {
                let mean = sum / n as f64;
                let var = (sum_sq / n as f64 - mean * mean).max(0.0);
                SliceMean {
                    x: binning.center(idx),
                    mean,
                    mean_error: (var / n as f64).sqrt(),
                    entries: n,
                }
            })
            .collect();
        Self { binning, slices }
    }

    /// `(x, mean, mean error)` points for a straight-line fit.
    pub fn mean_points(&self) -> Vec<(f64, f64, f64)> {
        self.slices.iter().map(|s| (s.x, s.mean, s.mean_error)).collect()
    }
}

/// Result of a weighted straight-line fit `y = intercept + slope * x`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    pub intercept_error: f64,
    pub slope_error: f64,
    pub chi2: f64,
    pub ndof: usize,
}

/// Weighted least-squares line through `(x, y, σ_y)` points.
///
/// Points with a non-positive or non-finite error get unit weight. `None`
/// with fewer than two points or when all x coincide.
pub fn fit_line(points: &[(f64, f64, f64)]) -> Option<LineFit> {
    if points.len() < 2 {
        return None;
    }
    let weight = |e: f64| if e.is_finite() && e > 0.0 { 1.0 / (e * e) } else { 1.0 };
    let (mut s, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for &(x, y, e) in points {
        let w = weight(e);
        s += w;
        sx += w * x;
        sy += w * y;
        sxx += w * x * x;
        sxy += w * x * y;
    }
    let det = s * sxx - sx * sx;
    if det.abs() <= 1e-12 * s * sxx.max(1.0) {
        return None;
    }
    let intercept = (sxx * sy - sx * sxy) / det;
    let slope = (s * sxy - sx * sy) / det;
    let chi2 = points
        .iter()
        .map(|&(x, y, e)| {
            let r = y - intercept - slope * x;
            weight(e) * r * r
        })
        .sum();
    Some(LineFit {
        intercept,
        slope,
        intercept_error: (sxx / det).sqrt(),
        slope_error: (s / det).sqrt(),
        chi2,
        ndof: points.len() - 2,
    })
}
