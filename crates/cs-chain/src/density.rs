//! Marginal density estimation.
//!
//! Two estimators share one seam: [`KernelEstimator`] smooths Monte-Carlo
//! draws with a weighted Gaussian kernel on a uniform evaluation grid, and
//! [`LatticeAggregator`] sums already-normalized weights over the distinct
//! values of a grid chain's column. The analysis engine picks one by the
//! chain's `is_grid` flag.

use cs_core::{Error, Result};

/// Normalized 1D density evaluated on an ascending grid.
///
/// `ys` integrates to one over `xs`; `cdf` is monotone from (near) zero to
/// one. For lattice curves `cdf[i]` is the discrete mass up to and including
/// `xs[i]`.
#[derive(Debug, Clone)]
pub struct DensityCurve {
    /// Evaluation points, strictly ascending.
    pub xs: Vec<f64>,
    /// Density values at `xs`.
    pub ys: Vec<f64>,
    /// Cumulative probability at `xs`.
    pub cdf: Vec<f64>,
}

impl DensityCurve {
    /// Curve for a degenerate column: all mass on a single value.
    pub fn point(value: f64) -> Self {
        Self { xs: vec![value], ys: vec![1.0], cdf: vec![1.0] }
    }

    /// Normalize raw density values on `xs` via the trapezoid rule and build
    /// the cumulative curve.
    pub fn from_unnormalized(xs: Vec<f64>, mut ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return Err(Error::Computation(format!(
                "density curve needs matching xs/ys with at least 2 points, got {}/{}",
                xs.len(),
                ys.len()
            )));
        }
        let mut total = 0.0;
        for i in 1..xs.len() {
            total += 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
        }
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::Computation(format!(
                "density mass must be positive and finite, got {total}"
            )));
        }
        for y in &mut ys {
            *y /= total;
        }
        let mut cdf = Vec::with_capacity(xs.len());
        cdf.push(0.0);
        let mut acc = 0.0;
        for i in 1..xs.len() {
            acc += 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
            cdf.push(acc.min(1.0));
        }
        // Land exactly on 1 so quantile(1.0) hits the last grid point.
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Ok(Self { xs, ys, cdf })
    }

    /// True when all mass sits on one point.
    pub fn is_point(&self) -> bool {
        self.xs.len() == 1
    }

    /// Index of the density maximum. The first maximum wins, so ties between
    /// equal modes break leftmost.
    pub fn mode_index(&self) -> usize {
        let mut best = 0;
        for (i, y) in self.ys.iter().enumerate() {
            if *y > self.ys[best] {
                best = i;
            }
        }
        best
    }

    /// Location of the density mode.
    pub fn mode(&self) -> f64 {
        self.xs[self.mode_index()]
    }

    /// Inverse CDF by linear interpolation. `q` is clamped to `[0, 1]`.
    pub fn quantile(&self, q: f64) -> f64 {
        let q = q.clamp(0.0, 1.0);
        if self.is_point() {
            return self.xs[0];
        }
        if q <= self.cdf[0] {
            return self.xs[0];
        }
        for i in 1..self.cdf.len() {
            if self.cdf[i] >= q {
                let span = self.cdf[i] - self.cdf[i - 1];
                if span <= 0.0 {
                    return self.xs[i - 1];
                }
                let t = (q - self.cdf[i - 1]) / span;
                return self.xs[i - 1] + t * (self.xs[i] - self.xs[i - 1]);
            }
        }
        self.xs[self.xs.len() - 1]
    }
}

/// Density estimation seam shared by the kernel and lattice paths.
pub trait DensityEstimator {
    /// Estimate a normalized marginal density for one weighted column.
    fn estimate(&self, values: &[f64], weights: &[f64]) -> Result<DensityCurve>;
}

/// Weighted Gaussian kernel density estimator on a uniform evaluation grid.
///
/// The grid spans the observed range extended by three bandwidths per side,
/// so the smoothed tails decay to (near) zero inside the grid. Bandwidth is
/// Scott's rule on the effective sample size `(Σw)² / Σw²`, scaled by
/// `bandwidth_scale`.
#[derive(Debug, Clone)]
pub struct KernelEstimator {
    /// Number of evaluation points.
    pub points: usize,
    /// Multiplier on the Scott's-rule bandwidth.
    pub bandwidth_scale: f64,
}

impl KernelEstimator {
    /// Estimator with the given grid resolution and bandwidth multiplier.
    pub fn new(points: usize, bandwidth_scale: f64) -> Self {
        Self { points, bandwidth_scale }
    }
}

impl DensityEstimator for KernelEstimator {
    fn estimate(&self, values: &[f64], weights: &[f64]) -> Result<DensityCurve> {
        check_column(values, weights)?;
        let (mean, std) = weighted_mean_std(values, weights);
        if std == 0.0 {
            return Ok(DensityCurve::point(mean));
        }

        let w_sum: f64 = weights.iter().sum();
        let w_sq_sum: f64 = weights.iter().map(|w| w * w).sum();
        let n_eff = w_sum * w_sum / w_sq_sum;
        let h = self.bandwidth_scale * std * n_eff.powf(-0.2);

        let (mut lo, mut hi) = min_max(values);
        lo -= 3.0 * h;
        hi += 3.0 * h;

        let m = self.points.max(16);
        let dx = (hi - lo) / (m - 1) as f64;
        let norm = 1.0 / (h * (2.0 * std::f64::consts::PI).sqrt() * w_sum);
        let mut xs = Vec::with_capacity(m);
        let mut ys = Vec::with_capacity(m);
        for j in 0..m {
            let x = lo + j as f64 * dx;
            let mut y = 0.0;
            for (v, w) in values.iter().zip(weights) {
                let z = (x - v) / h;
                y += w * (-0.5 * z * z).exp();
            }
            xs.push(x);
            ys.push(y * norm);
        }
        DensityCurve::from_unnormalized(xs, ys)
    }
}

/// Aggregator for grid chains: sums weights over the distinct values of the
/// target column, holding the other dimensions marginal. Weights are treated
/// as already-normalized density values; no smoothing is applied.
#[derive(Debug, Clone, Default)]
pub struct LatticeAggregator;

impl DensityEstimator for LatticeAggregator {
    fn estimate(&self, values: &[f64], weights: &[f64]) -> Result<DensityCurve> {
        check_column(values, weights)?;
        let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut xs: Vec<f64> = Vec::new();
        let mut mass: Vec<f64> = Vec::new();
        for (x, w) in pairs {
            match xs.last() {
                Some(last) if *last == x => *mass.last_mut().expect("mass tracks xs") += w,
                _ => {
                    xs.push(x);
                    mass.push(w);
                }
            }
        }
        if xs.len() == 1 {
            return Ok(DensityCurve::point(xs[0]));
        }

        let total: f64 = mass.iter().sum();
        let spacing = (xs[xs.len() - 1] - xs[0]) / (xs.len() - 1) as f64;
        let mut cdf = Vec::with_capacity(xs.len());
        let mut acc = 0.0;
        let mut ys = Vec::with_capacity(xs.len());
        for m in &mut mass {
            *m /= total;
            acc += *m;
            cdf.push(acc.min(1.0));
            ys.push(*m / spacing);
        }
        if let Some(last) = cdf.last_mut() {
            *last = 1.0;
        }
        Ok(DensityCurve { xs, ys, cdf })
    }
}

fn check_column(values: &[f64], weights: &[f64]) -> Result<()> {
    if values.is_empty() || values.len() != weights.len() {
        return Err(Error::Computation(format!(
            "density estimation needs a non-empty column with matching weights, got {}/{}",
            values.len(),
            weights.len()
        )));
    }
    Ok(())
}

/// Weighted mean and weighted standard deviation of a column.
pub(crate) fn weighted_mean_std(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let w_sum: f64 = weights.iter().sum();
    let mean = values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / w_sum;
    let var = values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean) * (v - mean))
        .sum::<f64>()
        / w_sum;
    (mean, var.max(0.0).sqrt())
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    (lo, hi)
}
