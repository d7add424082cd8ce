//! Chain entity: a named, weighted, immutable-after-construction sample set.
//!
//! Chains are only ever created through [`crate::ChainRegistry::add`]; the
//! registry owns default naming and recomputes the active parameter set.
//! The one mutable piece of a registered chain is its resolved display
//! configuration, rewritten whenever the registry is configured.

use cs_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::config::{ChainConfig, ChainOverrides};

/// Construction recipe for a chain, consumed by
/// [`crate::ChainRegistry::add`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSpec {
    samples: Vec<Vec<f64>>,
    parameters: Option<Vec<String>>,
    name: Option<String>,
    weights: Option<Vec<f64>>,
    log_posterior: Option<Vec<f64>>,
    grid: bool,
    overrides: ChainOverrides,
}

impl ChainSpec {
    /// Chain from a rectangular sample matrix, one row per draw and one
    /// column per parameter.
    pub fn matrix(samples: Vec<Vec<f64>>) -> Self {
        Self {
            samples,
            parameters: None,
            name: None,
            weights: None,
            log_posterior: None,
            grid: false,
            overrides: ChainOverrides::default(),
        }
    }

    /// Chain from a single sequence of draws, promoted to a one-column
    /// matrix.
    pub fn column(values: Vec<f64>) -> Self {
        Self::matrix(values.into_iter().map(|v| vec![v]).collect())
    }

    /// Parameter names, one per column. Defaults to `p1..pP`.
    pub fn with_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Chain name. Defaults to `"Chain {index}"` by insertion order.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Per-sample weights. Defaults to all ones.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Log-posterior value per sample.
    pub fn with_log_posterior(mut self, log_posterior: Vec<f64>) -> Self {
        self.log_posterior = Some(log_posterior);
        self
    }

    /// Mark the samples as a regular lattice over parameter space. Weights
    /// are then treated as already-normalized density values and no kernel
    /// smoothing is applied.
    pub fn grid(mut self) -> Self {
        self.grid = true;
        self
    }

    /// Per-chain configuration overrides, layered over the global
    /// configuration at configure time.
    pub fn with_overrides(mut self, overrides: ChainOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A named, weighted set of parameter-space samples plus display and
/// statistical configuration.
#[derive(Debug, Clone)]
pub struct Chain {
    name: String,
    samples: Vec<Vec<f64>>,
    parameters: Vec<String>,
    weights: Vec<f64>,
    log_posterior: Option<Vec<f64>>,
    grid: bool,
    overrides: ChainOverrides,
    config: ChainConfig,
}

impl Chain {
    /// Validate a spec and build the chain. `fallback_name` is the
    /// registry-assigned default used when the spec carries no name.
    pub(crate) fn from_spec(spec: ChainSpec, fallback_name: String) -> Result<Self> {
        let ChainSpec { samples, parameters, name, weights, log_posterior, grid, overrides } =
            spec;

        let n = samples.len();
        if n == 0 {
            return Err(Error::Validation("a chain requires at least one sample".into()));
        }
        let p = samples[0].len();
        if p == 0 {
            return Err(Error::Validation("a chain requires at least one parameter column".into()));
        }
        for (i, row) in samples.iter().enumerate() {
            if row.len() != p {
                return Err(Error::Validation(format!(
                    "sample matrix is not rectangular: row 0 has {p} columns, row {i} has {}",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::Validation(format!("sample row {i} contains a non-finite value")));
            }
        }

        let weights = match weights {
            None => vec![1.0; n],
            Some(w) => {
                if w.len() != n {
                    return Err(Error::Validation(format!(
                        "got {} weights for {n} samples",
                        w.len()
                    )));
                }
                if w.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(Error::Validation(
                        "weights must be finite and non-negative".into(),
                    ));
                }
                if w.iter().all(|v| *v == 0.0) {
                    return Err(Error::Validation("weights must not all be zero".into()));
                }
                w
            }
        };

        let parameters = match parameters {
            None => (1..=p).map(|i| format!("p{i}")).collect(),
            Some(names) => {
                if names.len() != p {
                    return Err(Error::Validation(format!(
                        "got {} parameter names for {p} columns",
                        names.len()
                    )));
                }
                for (i, a) in names.iter().enumerate() {
                    if names[..i].contains(a) {
                        return Err(Error::Validation(format!(
                            "duplicate parameter name {a:?}"
                        )));
                    }
                }
                names
            }
        };

        if let Some(lp) = &log_posterior {
            if lp.len() != n {
                return Err(Error::Validation(format!(
                    "got {} log-posterior values for {n} samples",
                    lp.len()
                )));
            }
            if lp.iter().any(|v| !v.is_finite()) {
                return Err(Error::Validation(
                    "log-posterior values must be finite".into(),
                ));
            }
        }

        overrides.validate()?;

        Ok(Self {
            name: name.unwrap_or(fallback_name),
            samples,
            parameters,
            weights,
            log_posterior,
            grid,
            overrides,
            config: ChainConfig::default(),
        })
    }

    /// Chain name, unique within its registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample matrix, row-major.
    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    /// Parameter names, one per sample column.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Per-sample weights. Always the sample count in length.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Log-posterior values, if supplied.
    pub fn log_posterior(&self) -> Option<&[f64]> {
        self.log_posterior.as_deref()
    }

    /// Whether the samples enumerate a regular lattice.
    pub fn is_grid(&self) -> bool {
        self.grid
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the chain holds no samples. Never true for a registered
    /// chain.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Column index of a parameter, if the chain has it.
    pub fn parameter_index(&self, parameter: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == parameter)
    }

    /// Extract the sample column for a parameter.
    pub fn column(&self, parameter: &str) -> Option<Vec<f64>> {
        let idx = self.parameter_index(parameter)?;
        Some(self.column_at(idx))
    }

    pub(crate) fn column_at(&self, index: usize) -> Vec<f64> {
        self.samples.iter().map(|row| row[index]).collect()
    }

    /// Resolved display/statistical configuration. Defaults until the
    /// registry is configured.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// This chain's configuration overrides.
    pub fn overrides(&self) -> &ChainOverrides {
        &self.overrides
    }

    pub(crate) fn set_config(&mut self, config: ChainConfig) {
        self.config = config;
    }

    pub(crate) fn set_overrides(&mut self, overrides: ChainOverrides) {
        self.overrides = overrides;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(spec: ChainSpec) -> Result<Chain> {
        Chain::from_spec(spec, "Chain 0".to_string())
    }

    #[test]
    fn column_spec_promotes_to_single_column_matrix() {
        let chain = build(ChainSpec::column(vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.parameters(), ["p1"]);
        assert_eq!(chain.column("p1").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn default_parameter_names_are_numbered() {
        let chain = build(ChainSpec::matrix(vec![vec![0.0, 1.0, 2.0]])).unwrap();
        assert_eq!(chain.parameters(), ["p1", "p2", "p3"]);
    }

    #[test]
    fn default_weights_are_ones() {
        let chain = build(ChainSpec::matrix(vec![vec![0.0], vec![1.0]])).unwrap();
        assert_eq!(chain.weights(), [1.0, 1.0]);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(build(ChainSpec::matrix(vec![])).is_err());
        assert!(build(ChainSpec::matrix(vec![vec![]])).is_err());
        assert!(build(ChainSpec::matrix(vec![vec![1.0, 2.0], vec![3.0]])).is_err());
        assert!(build(ChainSpec::column(vec![1.0, f64::NAN])).is_err());
    }

    #[test]
    fn rejects_weight_mismatch_and_bad_weights() {
        let rows = vec![vec![0.0], vec![1.0]];
        assert!(build(ChainSpec::matrix(rows.clone()).with_weights(vec![1.0])).is_err());
        assert!(build(ChainSpec::matrix(rows.clone()).with_weights(vec![1.0, -0.5])).is_err());
        assert!(build(ChainSpec::matrix(rows)).is_ok());
    }

    #[test]
    fn rejects_all_zero_weights() {
        let spec = ChainSpec::column(vec![1.0, 2.0]).with_weights(vec![0.0, 0.0]);
        assert!(build(spec).is_err());
    }

    #[test]
    fn rejects_duplicate_parameter_names() {
        let spec = ChainSpec::matrix(vec![vec![0.0, 1.0]]).with_parameters(["x", "x"]);
        assert!(build(spec).is_err());
    }

    #[test]
    fn rejects_parameter_count_mismatch() {
        let spec = ChainSpec::matrix(vec![vec![0.0, 1.0]]).with_parameters(["x"]);
        assert!(build(spec).is_err());
    }

    #[test]
    fn rejects_log_posterior_length_mismatch() {
        let spec = ChainSpec::column(vec![1.0, 2.0]).with_log_posterior(vec![0.0]);
        assert!(build(spec).is_err());
    }

    #[test]
    fn rejects_non_finite_log_posterior() {
        let spec =
            ChainSpec::column(vec![1.0, 2.0]).with_log_posterior(vec![-0.5, f64::NEG_INFINITY]);
        assert!(build(spec).is_err());
        let spec = ChainSpec::column(vec![1.0, 2.0]).with_log_posterior(vec![-0.5, f64::NAN]);
        assert!(build(spec).is_err());
    }

    #[test]
    fn rejects_bad_overrides_at_construction() {
        let spec = ChainSpec::column(vec![1.0, 2.0])
            .with_overrides(ChainOverrides::none().with_shade_alpha(2.0));
        assert!(build(spec).is_err());
        let spec = ChainSpec::column(vec![1.0, 2.0])
            .with_overrides(ChainOverrides::none().with_summary_area(0.5));
        assert!(build(spec).is_ok());
    }
}
