//! Marginal-distribution artifact (numbers-first).
//!
//! One straight snapshot of everything a renderer needs to draw stacked
//! marginal panels: shared axis extents per parameter, and per chain a
//! density polyline, interval bounds, colour and shade opacity.

use std::time::{SystemTime, UNIX_EPOCH};

use cs_chain::{AnalysisEngine, Chain, ChainRegistry, GeometryEngine};
use cs_core::Result;
use serde::Serialize;

/// Wire schema identifier. Bump on breaking layout changes.
pub const SCHEMA_VERSION: &str = "chainscope_marginals_v1";

/// Top-level marginals artifact.
#[derive(Debug, Clone, Serialize)]
pub struct MarginalsArtifact {
    /// Wire schema identifier.
    pub schema_version: String,
    /// Producer metadata.
    pub meta: MarginalsMeta,
    /// Shared axes: one entry per active parameter, in first-appearance
    /// order.
    pub parameters: Vec<ParameterAxis>,
    /// One series bundle per chain, in registration order.
    pub chains: Vec<ChainSeries>,
}

/// Producer metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MarginalsMeta {
    /// Tool name.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation timestamp, milliseconds since the Unix epoch.
    pub created_unix_ms: u128,
}

/// Shared axis extents for one parameter across every registered chain.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterAxis {
    /// Parameter name.
    pub name: String,
    /// Axis minimum.
    pub lo: f64,
    /// Axis maximum.
    pub hi: f64,
}

/// All marginal series of one chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSeries {
    /// Chain name.
    pub name: String,
    /// Resolved display colour.
    pub color: String,
    /// Resolved shade opacity.
    pub shade_alpha: f64,
    /// One series per parameter the chain contains.
    pub marginals: Vec<MarginalSeries>,
}

/// Density polyline plus interval bounds for one (chain, parameter) pair.
#[derive(Debug, Clone, Serialize)]
pub struct MarginalSeries {
    /// Parameter name.
    pub parameter: String,
    /// Density evaluation points.
    pub xs: Vec<f64>,
    /// Normalized density values.
    pub ys: Vec<f64>,
    /// Credible-interval lower bound.
    pub lower: f64,
    /// Central value.
    pub central: f64,
    /// Credible-interval upper bound.
    pub upper: f64,
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| cs_core::Error::Computation(format!("system time error: {e}")))?;
    Ok(d.as_millis())
}

/// Build the marginals artifact from current registry state.
///
/// Configure the registry first so colours and shade alphas are resolved;
/// an unconfigured registry serializes with built-in defaults.
pub fn marginals_artifact(registry: &ChainRegistry) -> Result<MarginalsArtifact> {
    let engine = AnalysisEngine::new();
    let geometry = GeometryEngine::new();

    let mut parameters = Vec::with_capacity(registry.active_parameters().len());
    for name in registry.active_parameters() {
        let (lo, hi) = geometry.registry_extents(name, registry)?;
        parameters.push(ParameterAxis { name: name.clone(), lo, hi });
    }

    let mut chains = Vec::with_capacity(registry.len());
    for chain in registry.chains() {
        chains.push(chain_series(&engine, chain)?);
    }

    Ok(MarginalsArtifact {
        schema_version: SCHEMA_VERSION.to_string(),
        meta: MarginalsMeta {
            tool: "chainscope".to_string(),
            tool_version: cs_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
        },
        parameters,
        chains,
    })
}

fn chain_series(engine: &AnalysisEngine, chain: &Chain) -> Result<ChainSeries> {
    let mut marginals = Vec::with_capacity(chain.parameters().len());
    for parameter in chain.parameters() {
        let curve = engine.marginal_density(chain, parameter)?;
        let interval = engine.summarize_parameter(chain, parameter)?;
        marginals.push(MarginalSeries {
            parameter: parameter.clone(),
            xs: curve.xs,
            ys: curve.ys,
            lower: interval.lower,
            central: interval.central,
            upper: interval.upper,
        });
    }
    Ok(ChainSeries {
        name: chain.name().to_string(),
        color: chain.config().color.clone(),
        shade_alpha: chain.config().shade_alpha,
        marginals,
    })
}
