//! Shared axis extents across heterogeneous chains.
//!
//! Extents give a rendering layer one consistent `(min, max)` range per
//! parameter regardless of which chains contain it. Grid chains contribute
//! their literal lattice bounds (the lattice *is* the support); sampled
//! chains contribute a padded span around the weighted mean, or their
//! weighted-extreme values, depending on the configured policy.

use cs_core::{Error, Result};

use crate::chain::Chain;
use crate::config::ExtentsPolicy;
use crate::density::{min_max, weighted_mean_std};
use crate::registry::ChainRegistry;

/// Auto-balanced shade opacity for a registry of `chain_count` chains.
/// Overlaid shading then sums to full opacity no matter how many chains are
/// displayed together.
pub fn default_shade_alpha(chain_count: usize) -> f64 {
    if chain_count == 0 {
        1.0
    } else {
        1.0 / chain_count as f64
    }
}

/// Computes shared plot geometry from chains. Reads chain state only; the
/// shade-alpha write-back happens inside `ChainRegistry::configure`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryEngine;

impl GeometryEngine {
    /// New engine.
    pub fn new() -> Self {
        Self
    }

    /// `(min, max)` for a parameter over every chain in `chains` that
    /// contains it. Chains lacking the parameter are skipped; if none has
    /// it, the query fails with a lookup error.
    pub fn extents(&self, parameter: &str, chains: &[&Chain]) -> Result<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        let mut found = false;
        for chain in chains {
            let Some(idx) = chain.parameter_index(parameter) else {
                continue;
            };
            found = true;
            let (l, h) = chain_span(chain, idx);
            lo = lo.min(l);
            hi = hi.max(h);
        }
        if !found {
            return Err(Error::Lookup(format!(
                "no chain in the input set contains parameter {parameter:?}"
            )));
        }
        Ok((lo, hi))
    }

    /// Extents over every chain currently registered.
    pub fn registry_extents(&self, parameter: &str, registry: &ChainRegistry) -> Result<(f64, f64)> {
        let chains: Vec<&Chain> = registry.chains().iter().collect();
        self.extents(parameter, &chains)
    }
}

fn chain_span(chain: &Chain, column: usize) -> (f64, f64) {
    let values = chain.column_at(column);
    if chain.is_grid() {
        // The lattice defines the support bounds exactly; no padding.
        return min_max(&values);
    }
    match chain.config().extents_policy {
        ExtentsPolicy::Sigma => {
            let (mean, std) = weighted_mean_std(&values, chain.weights());
            let pad = chain.config().extent_sigma * std;
            (mean - pad, mean + pad)
        }
        ExtentsPolicy::Extrema => {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for (v, w) in values.iter().zip(chain.weights()) {
                if *w > 0.0 {
                    lo = lo.min(*v);
                    hi = hi.max(*v);
                }
            }
            (lo, hi)
        }
    }
}
