//! Credible-interval summaries per (chain, parameter).
//!
//! For every parameter in a chain the engine estimates the marginal density
//! (kernel-smoothed for Monte-Carlo chains, lattice-aggregated for grid
//! chains) and places an interval of the configured probability mass on it
//! under the chain's configured convention.

use cs_core::{CredibleInterval, Error, Result, SummaryStatistic};
use serde::Serialize;

use crate::chain::Chain;
use crate::density::{
    weighted_mean_std, DensityCurve, DensityEstimator, KernelEstimator, LatticeAggregator,
};
use crate::registry::ChainRegistry;

/// One parameter's summary within a chain.
#[derive(Debug, Clone, Serialize)]
pub struct MarginalSummary {
    /// Parameter name.
    pub parameter: String,
    /// Interval bounds and central value.
    #[serde(flatten)]
    pub interval: CredibleInterval,
}

/// All marginal summaries of one chain, in the chain's parameter order.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    /// Chain name.
    pub chain: String,
    /// Per-parameter summaries.
    pub marginals: Vec<MarginalSummary>,
}

impl ChainSummary {
    /// Summary for a parameter, if the chain has it.
    pub fn marginal(&self, parameter: &str) -> Option<&CredibleInterval> {
        self.marginals.iter().find(|m| m.parameter == parameter).map(|m| &m.interval)
    }
}

/// Computes marginal summaries from current registry state. Holds no state
/// of its own; per-chain configuration is read from the chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisEngine;

impl AnalysisEngine {
    /// New engine.
    pub fn new() -> Self {
        Self
    }

    /// Summaries for every registered chain, in registration order. Chains
    /// with disjoint parameter sets each contribute independently.
    pub fn summarize(&self, registry: &ChainRegistry) -> Result<Vec<ChainSummary>> {
        if registry.is_empty() {
            return Err(Error::Validation(
                "no chains registered; add a chain before requesting summaries".into(),
            ));
        }
        registry.chains().iter().map(|chain| self.summarize_chain(chain)).collect()
    }

    /// Summaries for every parameter of one chain.
    pub fn summarize_chain(&self, chain: &Chain) -> Result<ChainSummary> {
        let mut marginals = Vec::with_capacity(chain.parameters().len());
        for parameter in chain.parameters() {
            let interval = self.summarize_parameter(chain, parameter)?;
            marginals.push(MarginalSummary { parameter: parameter.clone(), interval });
        }
        Ok(ChainSummary { chain: chain.name().to_string(), marginals })
    }

    /// Summary of a single parameter within a chain. `Lookup` if the chain
    /// does not contain the parameter.
    pub fn summarize_parameter(&self, chain: &Chain, parameter: &str) -> Result<CredibleInterval> {
        let curve = self.marginal_density(chain, parameter)?;
        if curve.is_point() {
            return Ok(CredibleInterval::point(curve.xs[0]));
        }
        let cfg = chain.config();
        let area = cfg.summary_area;
        Ok(match cfg.statistic {
            SummaryStatistic::Shortest => shortest_interval(&curve, area, parameter),
            SummaryStatistic::CentralPercentile => CredibleInterval {
                lower: curve.quantile(0.5 - 0.5 * area),
                central: curve.quantile(0.5),
                upper: curve.quantile(0.5 + 0.5 * area),
            },
            SummaryStatistic::Symmetric => {
                let lower = curve.quantile(0.5 - 0.5 * area);
                let upper = curve.quantile(0.5 + 0.5 * area);
                CredibleInterval { lower, central: 0.5 * (lower + upper), upper }
            }
        })
    }

    /// The marginal density curve the summary is computed from. Grid chains
    /// aggregate the lattice; Monte-Carlo chains are kernel-smoothed.
    /// Degenerate columns yield a single-point curve.
    pub fn marginal_density(&self, chain: &Chain, parameter: &str) -> Result<DensityCurve> {
        let idx = chain.parameter_index(parameter).ok_or_else(|| {
            Error::Lookup(format!(
                "chain {:?} has no parameter {parameter:?}",
                chain.name()
            ))
        })?;
        let values = chain.column_at(idx);
        let weights = chain.weights();
        let (mean, std) = weighted_mean_std(&values, weights);
        if std == 0.0 {
            return Ok(DensityCurve::point(mean));
        }
        let cfg = chain.config();
        if chain.is_grid() {
            LatticeAggregator.estimate(&values, weights)
        } else {
            KernelEstimator::new(cfg.grid_points, cfg.bandwidth_scale).estimate(&values, weights)
        }
    }
}

/// Shortest interval of the target mass by waterline bisection: lower the
/// density level until the region above it (around the mode) encloses the
/// target mass. The mode is the leftmost density arg-max, so equal-width
/// ties on symmetric multimodal curves resolve to the leftmost interval.
fn shortest_interval(curve: &DensityCurve, target: f64, parameter: &str) -> CredibleInterval {
    const MAX_ITER: usize = 50;
    const TOLERANCE: f64 = 1e-3;

    let mode_idx = curve.mode_index();
    let n = curve.xs.len();
    let mut level_lo = 0.0;
    let mut level_hi = curve.ys[mode_idx];
    let mut best = (f64::INFINITY, 0usize, n - 1);

    for _ in 0..MAX_ITER {
        let level = 0.5 * (level_lo + level_hi);
        // First point below the waterline on each side of the mode; the
        // bounds land just outside the enclosed region.
        let i1 = (0..=mode_idx).rev().find(|&i| curve.ys[i] < level).unwrap_or(0);
        let i2 = (mode_idx..n).find(|&i| curve.ys[i] < level).unwrap_or(n - 1);
        let enclosed = curve.cdf[i2] - curve.cdf[i1];
        let deviation = (enclosed - target).abs();
        if deviation < best.0 {
            best = (deviation, i1, i2);
        }
        if deviation < TOLERANCE {
            return CredibleInterval {
                lower: curve.xs[i1],
                central: curve.xs[mode_idx],
                upper: curve.xs[i2],
            };
        }
        if enclosed < target {
            level_hi = level;
        } else {
            level_lo = level;
        }
    }

    log::warn!(
        "shortest-interval search for {parameter:?} did not reach the target mass \
         within {MAX_ITER} iterations; using the nearest achievable interval"
    );
    CredibleInterval {
        lower: curve.xs[best.1],
        central: curve.xs[mode_idx],
        upper: curve.xs[best.2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainSpec;
    use crate::config::GlobalConfig;
    use approx::assert_relative_eq;
    use cs_core::SummaryStatistic;

    fn gaussian_lattice(mu: f64, sigma: f64, half_span: f64, points: usize) -> (Vec<f64>, Vec<f64>) {
        let lo = mu - half_span;
        let hi = mu + half_span;
        let dx = (hi - lo) / (points - 1) as f64;
        let xs: Vec<f64> = (0..points).map(|i| lo + i as f64 * dx).collect();
        let ws: Vec<f64> =
            xs.iter().map(|x| (-0.5 * ((x - mu) / sigma).powi(2)).exp()).collect();
        (xs, ws)
    }

    fn grid_registry(mu: f64, sigma: f64) -> ChainRegistry {
        let (xs, ws) = gaussian_lattice(mu, sigma, 6.0 * sigma, 401);
        let mut reg = ChainRegistry::new();
        reg.add(ChainSpec::column(xs).with_weights(ws).with_parameters(["x"]).grid()).unwrap();
        reg.configure(&GlobalConfig::default()).unwrap();
        reg
    }

    #[test]
    fn grid_gaussian_recovers_one_sigma_interval() {
        let reg = grid_registry(5.0, 1.5);
        let summary = AnalysisEngine::new().summarize(&reg).unwrap();
        let iv = summary[0].marginal("x").unwrap();
        assert_relative_eq!(iv.central, 5.0, epsilon = 0.05);
        assert_relative_eq!(iv.half_width(), 1.5, epsilon = 0.1);
    }

    #[test]
    fn conventions_agree_on_a_symmetric_grid_density() {
        let mut reg = grid_registry(0.0, 1.0);
        let engine = AnalysisEngine::new();
        let chain_name = reg.chains()[0].name().to_string();

        let mut results = Vec::new();
        for statistic in [
            SummaryStatistic::Shortest,
            SummaryStatistic::CentralPercentile,
            SummaryStatistic::Symmetric,
        ] {
            let global = GlobalConfig { statistic, ..Default::default() };
            reg.configure(&global).unwrap();
            let chain = reg.chain(chain_name.as_str()).unwrap();
            results.push(engine.summarize_parameter(chain, "x").unwrap());
        }
        for iv in &results {
            assert_relative_eq!(iv.central, 0.0, epsilon = 0.05);
            assert_relative_eq!(iv.half_width(), 1.0, epsilon = 0.1);
        }
    }

    #[test]
    fn degenerate_column_collapses_to_point() {
        let mut reg = ChainRegistry::new();
        reg.add(ChainSpec::column(vec![7.0; 50]).with_parameters(["c"])).unwrap();
        let iv =
            AnalysisEngine::new().summarize_parameter(&reg.chains()[0], "c").unwrap();
        assert!(iv.is_degenerate());
        assert_eq!(iv.central, 7.0);
    }

    #[test]
    fn zero_weighted_variance_counts_as_degenerate() {
        // The only positively-weighted sample is 3.0; outliers carry zero
        // weight and must not widen the summary.
        let mut reg = ChainRegistry::new();
        reg.add(
            ChainSpec::column(vec![3.0, 100.0, -40.0])
                .with_weights(vec![2.0, 0.0, 0.0])
                .with_parameters(["c"]),
        )
        .unwrap();
        let iv = AnalysisEngine::new().summarize_parameter(&reg.chains()[0], "c").unwrap();
        assert_eq!(iv, CredibleInterval::point(3.0));
    }

    #[test]
    fn unknown_parameter_is_a_lookup_error() {
        let reg = grid_registry(0.0, 1.0);
        let err = AnalysisEngine::new().summarize_parameter(&reg.chains()[0], "missing");
        assert!(matches!(err, Err(Error::Lookup(_))));
    }

    #[test]
    fn empty_registry_is_a_validation_error() {
        let reg = ChainRegistry::new();
        assert!(matches!(
            AnalysisEngine::new().summarize(&reg),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn shortest_interval_tie_breaks_leftmost() {
        // Symmetric bimodal lattice: two equal modes at -2 and 2. The
        // documented tie-break keeps the central value on the left mode.
        let xs: Vec<f64> = (0..401).map(|i| -4.0 + i as f64 * 0.02).collect();
        let ws: Vec<f64> = xs
            .iter()
            .map(|x| {
                (-0.5 * ((x + 2.0) / 0.5).powi(2)).exp() + (-0.5 * ((x - 2.0) / 0.5).powi(2)).exp()
            })
            .collect();
        let mut reg = ChainRegistry::new();
        reg.add(ChainSpec::column(xs).with_weights(ws).with_parameters(["x"]).grid()).unwrap();
        reg.configure(&GlobalConfig::default()).unwrap();
        let iv = AnalysisEngine::new().summarize_parameter(&reg.chains()[0], "x").unwrap();
        assert_relative_eq!(iv.central, -2.0, epsilon = 0.05);
    }

    #[test]
    fn fallback_returns_nearest_achievable_interval() {
        // A coarse three-point lattice cannot hit the target mass exactly;
        // the search must still return finite bounds instead of raising.
        let mut reg = ChainRegistry::new();
        reg.add(
            ChainSpec::column(vec![0.0, 1.0, 2.0])
                .with_weights(vec![0.25, 0.5, 0.25])
                .with_parameters(["x"])
                .grid(),
        )
        .unwrap();
        reg.configure(&GlobalConfig::default()).unwrap();
        let iv = AnalysisEngine::new().summarize_parameter(&reg.chains()[0], "x").unwrap();
        assert!(iv.lower.is_finite() && iv.upper.is_finite());
        assert!(iv.lower <= iv.central && iv.central <= iv.upper);
    }
}
