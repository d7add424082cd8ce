//! Gelman-Rubin convergence diagnostic across registered chains.
//!
//! With `m` chains of (average) length `n` sharing a parameter, the
//! between-chain variance `B` and mean within-chain variance `W` combine
//! into `V = (n-1)/n * W + B/n`, and `R = sqrt(V / W)`. Values near one
//! indicate the chains sample the same distribution. Means and variances
//! are weighted, so importance-weighted chains are handled consistently
//! with the summary engine.

use cs_core::{Error, Result};
use serde::Serialize;

use crate::density::weighted_mean_std;
use crate::registry::ChainRegistry;

/// Gelman-Rubin statistic for one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct RhatEntry {
    /// Parameter name.
    pub parameter: String,
    /// The potential scale reduction factor.
    pub r_hat: f64,
    /// How many chains contained the parameter.
    pub n_chains: usize,
}

impl RhatEntry {
    /// Whether `r_hat` deviates from one by less than `threshold`.
    pub fn passed(&self, threshold: f64) -> bool {
        (self.r_hat - 1.0).abs() < threshold
    }
}

/// Gelman-Rubin statistic per active parameter, computed across every
/// registered chain containing it. Parameters covered by fewer than two
/// chains are skipped.
pub fn gelman_rubin(registry: &ChainRegistry) -> Result<Vec<RhatEntry>> {
    if registry.is_empty() {
        return Err(Error::Validation(
            "no chains registered; add chains before running diagnostics".into(),
        ));
    }
    let mut entries = Vec::new();
    for parameter in registry.active_parameters() {
        let mut means = Vec::new();
        let mut vars = Vec::new();
        let mut lengths = Vec::new();
        for chain in registry.chains() {
            let Some(idx) = chain.parameter_index(parameter) else {
                continue;
            };
            let values = chain.column_at(idx);
            let (mean, std) = weighted_mean_std(&values, chain.weights());
            means.push(mean);
            vars.push(std * std);
            lengths.push(chain.len() as f64);
        }
        if means.len() < 2 {
            continue;
        }
        let m = means.len() as f64;
        let n = lengths.iter().sum::<f64>() / m;
        let grand_mean = means.iter().sum::<f64>() / m;
        let b = n / (m - 1.0) * means.iter().map(|mu| (mu - grand_mean).powi(2)).sum::<f64>();
        let w = vars.iter().sum::<f64>() / m;
        let r_hat = if w > 0.0 {
            let v = (n - 1.0) / n * w + b / n;
            (v / w).sqrt()
        } else if b > 0.0 {
            f64::INFINITY
        } else {
            1.0
        };
        entries.push(RhatEntry { parameter: parameter.clone(), r_hat, n_chains: means.len() });
    }
    Ok(entries)
}
