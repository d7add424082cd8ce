//! Ordered chain registry with name/index resolution.
//!
//! Mutations (add, remove, rename) recompute the active parameter set
//! synchronously before returning. Multi-chain removal is two-phase: every
//! reference is resolved against the pre-removal snapshot first, and any
//! failure aborts the call with no chain removed.

use std::fmt;

use cs_core::{Error, Result};

use crate::chain::{Chain, ChainSpec};
use crate::config::{ChainConfig, ChainOverrides, GlobalConfig};

/// Reference to a registered chain, by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainRef {
    /// Position in current registration order.
    Index(usize),
    /// Chain name.
    Name(String),
}

impl From<usize> for ChainRef {
    fn from(index: usize) -> Self {
        ChainRef::Index(index)
    }
}

impl From<&str> for ChainRef {
    fn from(name: &str) -> Self {
        ChainRef::Name(name.to_string())
    }
}

impl From<String> for ChainRef {
    fn from(name: String) -> Self {
        ChainRef::Name(name)
    }
}

impl fmt::Display for ChainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainRef::Index(i) => write!(f, "index {i}"),
            ChainRef::Name(n) => write!(f, "name {n:?}"),
        }
    }
}

/// Ordered collection of chains. Insertion order drives default naming,
/// colour assignment and the ordering of the active parameter set.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<Chain>,
    active: Vec<String>,
    // Monotone insertion counter; never reused, so auto-generated names stay
    // unique across interleaved add/remove.
    inserted: usize,
}

impl ChainRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered chains, in registration order.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Number of registered chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True when no chain is registered.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Union of all chains' parameter names, ordered by first appearance in
    /// registration order.
    pub fn active_parameters(&self) -> &[String] {
        &self.active
    }

    /// Validate a spec and register the chain, recomputing the active
    /// parameter set. Returns a reference to the stored chain.
    pub fn add(&mut self, spec: ChainSpec) -> Result<&Chain> {
        let fallback = format!("Chain {}", self.inserted);
        let chain = Chain::from_spec(spec, fallback)?;
        if self.chains.iter().any(|c| c.name() == chain.name()) {
            return Err(Error::Validation(format!(
                "chain name {:?} is already registered",
                chain.name()
            )));
        }
        log::debug!(
            "registered chain {:?}: {} samples, {} parameters, grid={}",
            chain.name(),
            chain.len(),
            chain.parameters().len(),
            chain.is_grid()
        );
        self.chains.push(chain);
        self.inserted += 1;
        self.recompute_active();
        let idx = self.chains.len() - 1;
        Ok(&self.chains[idx])
    }

    /// Resolve a reference to a concrete position in current order.
    pub fn resolve(&self, chain: &ChainRef) -> Result<usize> {
        match chain {
            ChainRef::Index(i) => {
                if *i < self.chains.len() {
                    Ok(*i)
                } else {
                    Err(Error::Lookup(format!(
                        "chain index {i} out of range for {} registered chains",
                        self.chains.len()
                    )))
                }
            }
            ChainRef::Name(name) => self
                .chains
                .iter()
                .position(|c| c.name() == name)
                .ok_or_else(|| Error::Lookup(format!("no chain named {name:?}"))),
        }
    }

    /// Look up a chain by reference.
    pub fn chain(&self, chain: impl Into<ChainRef>) -> Result<&Chain> {
        let idx = self.resolve(&chain.into())?;
        Ok(&self.chains[idx])
    }

    /// Replace a chain's configuration overrides. Takes effect at the next
    /// `configure`.
    pub fn set_overrides(
        &mut self,
        chain: impl Into<ChainRef>,
        overrides: ChainOverrides,
    ) -> Result<()> {
        overrides.validate()?;
        let idx = self.resolve(&chain.into())?;
        self.chains[idx].set_overrides(overrides);
        Ok(())
    }

    /// Remove the most recently registered chain.
    pub fn remove_last(&mut self) -> Result<Chain> {
        let chain = self
            .chains
            .pop()
            .ok_or_else(|| Error::Lookup("cannot remove from an empty registry".into()))?;
        log::debug!("removed chain {:?}", chain.name());
        self.recompute_active();
        Ok(chain)
    }

    /// Remove a single chain by name or index.
    pub fn remove(&mut self, chain: impl Into<ChainRef>) -> Result<Chain> {
        let idx = self.resolve(&chain.into())?;
        let chain = self.chains.remove(idx);
        log::debug!("removed chain {:?}", chain.name());
        self.recompute_active();
        Ok(chain)
    }

    /// Remove several chains in one atomic step. References may mix names
    /// and indices and are all resolved against the pre-removal order; two
    /// references resolving to the same chain fail the whole call with
    /// nothing removed.
    pub fn remove_many(&mut self, chains: &[ChainRef]) -> Result<Vec<Chain>> {
        let mut indices = Vec::with_capacity(chains.len());
        for r in chains {
            let idx = self.resolve(r)?;
            if indices.contains(&idx) {
                return Err(Error::Validation(format!(
                    "cannot remove the same chain twice ({r} also resolves to index {idx})"
                )));
            }
            indices.push(idx);
        }
        // Extract in descending index order so earlier removals cannot shift
        // later ones, then restore the caller's order.
        let mut order: Vec<usize> = (0..indices.len()).collect();
        order.sort_by(|a, b| indices[*b].cmp(&indices[*a]));
        let mut removed: Vec<Option<Chain>> = (0..indices.len()).map(|_| None).collect();
        for slot in order {
            removed[slot] = Some(self.chains.remove(indices[slot]));
        }
        self.recompute_active();
        let removed: Vec<Chain> = removed.into_iter().flatten().collect();
        for chain in &removed {
            log::debug!("removed chain {:?}", chain.name());
        }
        Ok(removed)
    }

    /// Rename a chain. The new name must be unique within the registry.
    pub fn rename(&mut self, chain: impl Into<ChainRef>, new_name: impl Into<String>) -> Result<()> {
        let new_name = new_name.into();
        let idx = self.resolve(&chain.into())?;
        if self.chains.iter().enumerate().any(|(i, c)| i != idx && c.name() == new_name) {
            return Err(Error::Validation(format!(
                "chain name {new_name:?} is already registered"
            )));
        }
        self.chains[idx].set_name(new_name);
        Ok(())
    }

    /// Validate the global configuration, then resolve and write each
    /// chain's configuration snapshot, including the auto-balanced shade
    /// alpha. A validation failure leaves every chain untouched.
    pub fn configure(&mut self, global: &GlobalConfig) -> Result<()> {
        global.validate()?;
        for chain in &self.chains {
            chain.overrides().validate()?;
        }
        let count = self.chains.len();
        for (position, chain) in self.chains.iter_mut().enumerate() {
            let resolved = ChainConfig::resolve(global, chain.overrides(), position, count);
            chain.set_config(resolved);
        }
        Ok(())
    }

    fn recompute_active(&mut self) {
        self.active.clear();
        for chain in &self.chains {
            for p in chain.parameters() {
                if !self.active.contains(p) {
                    self.active.push(p.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_param_chain(values: &[(f64, f64)]) -> ChainSpec {
        ChainSpec::matrix(values.iter().map(|(a, b)| vec![*a, *b]).collect())
    }

    fn registry_with_three() -> ChainRegistry {
        let mut reg = ChainRegistry::new();
        reg.add(two_param_chain(&[(0.0, 1.0), (1.0, 2.0)]).with_parameters(["a", "b"])).unwrap();
        reg.add(two_param_chain(&[(5.0, 6.0), (7.0, 8.0)]).with_parameters(["b", "c"])).unwrap();
        reg.add(ChainSpec::column(vec![1.0, 2.0]).with_parameters(["d"]).with_name("named"))
            .unwrap();
        reg
    }

    #[test]
    fn auto_names_follow_insertion_order() {
        let reg = registry_with_three();
        let names: Vec<&str> = reg.chains().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["Chain 0", "Chain 1", "named"]);
    }

    #[test]
    fn auto_names_stay_unique_after_removal() {
        let mut reg = ChainRegistry::new();
        reg.add(ChainSpec::column(vec![1.0])).unwrap();
        reg.add(ChainSpec::column(vec![2.0])).unwrap();
        reg.remove(0usize).unwrap();
        let added = reg.add(ChainSpec::column(vec![3.0])).unwrap();
        assert_eq!(added.name(), "Chain 2");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut reg = ChainRegistry::new();
        reg.add(ChainSpec::column(vec![1.0]).with_name("x")).unwrap();
        assert!(reg.add(ChainSpec::column(vec![2.0]).with_name("x")).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn active_parameters_union_first_appearance() {
        let reg = registry_with_three();
        assert_eq!(reg.active_parameters(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn removing_sole_owner_drops_parameters() {
        let mut reg = registry_with_three();
        reg.remove("named").unwrap();
        assert_eq!(reg.active_parameters(), ["a", "b", "c"]);
        reg.remove(0usize).unwrap();
        assert_eq!(reg.active_parameters(), ["b", "c"]);
    }

    #[test]
    fn remove_many_accepts_mixed_references() {
        let mut reg = registry_with_three();
        let removed =
            reg.remove_many(&[ChainRef::from("named"), ChainRef::from(0usize)]).unwrap();
        assert_eq!(removed[0].name(), "named");
        assert_eq!(removed[1].name(), "Chain 0");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.chains()[0].name(), "Chain 1");
    }

    #[test]
    fn remove_many_rejects_duplicates_atomically() {
        let mut reg = registry_with_three();
        let err = reg.remove_many(&[ChainRef::from(0usize), ChainRef::from(0usize)]);
        assert!(matches!(err, Err(Error::Validation(_))));
        assert_eq!(reg.len(), 3, "no chain may be removed on failure");

        // A name and an index pointing at the same chain also count as
        // duplicates.
        let err = reg.remove_many(&[ChainRef::from("named"), ChainRef::from(2usize)]);
        assert!(matches!(err, Err(Error::Validation(_))));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn remove_many_fails_whole_call_on_unknown_reference() {
        let mut reg = registry_with_three();
        let err = reg.remove_many(&[ChainRef::from(0usize), ChainRef::from("missing")]);
        assert!(matches!(err, Err(Error::Lookup(_))));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn remove_last_pops_in_registration_order() {
        let mut reg = registry_with_three();
        assert_eq!(reg.remove_last().unwrap().name(), "named");
        assert_eq!(reg.remove_last().unwrap().name(), "Chain 1");
        assert_eq!(reg.remove_last().unwrap().name(), "Chain 0");
        assert!(reg.remove_last().is_err());
    }

    #[test]
    fn rename_then_remove_by_new_name() {
        let mut reg = registry_with_three();
        reg.rename(0usize, "first").unwrap();
        assert!(reg.rename(1usize, "first").is_err());
        reg.remove("first").unwrap();
        assert_eq!(reg.len(), 2);
        assert!(matches!(reg.chain("Chain 0"), Err(Error::Lookup(_))));
    }

    #[test]
    fn resolve_reports_lookup_errors() {
        let reg = registry_with_three();
        assert!(matches!(reg.resolve(&ChainRef::from(9usize)), Err(Error::Lookup(_))));
        assert!(matches!(reg.resolve(&ChainRef::from("nope")), Err(Error::Lookup(_))));
    }

    #[test]
    fn configure_writes_resolved_alpha_into_chains() {
        let mut reg = registry_with_three();
        reg.configure(&GlobalConfig::default()).unwrap();
        for chain in reg.chains() {
            assert!((chain.config().shade_alpha - 1.0 / 3.0).abs() < 1e-12);
        }
        reg.remove_last().unwrap();
        reg.configure(&GlobalConfig::default()).unwrap();
        for chain in reg.chains() {
            assert!((chain.config().shade_alpha - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn configure_rejects_bad_global_without_touching_chains() {
        let mut reg = registry_with_three();
        reg.configure(&GlobalConfig::default()).unwrap();
        let bad = GlobalConfig { summary_area: 1.0, ..Default::default() };
        assert!(reg.configure(&bad).is_err());
        // Previous resolution survives.
        assert!((reg.chains()[0].config().shade_alpha - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn override_alpha_survives_reconfigure() {
        let mut reg = registry_with_three();
        reg.set_overrides(1usize, ChainOverrides::none().with_shade_alpha(0.9)).unwrap();
        reg.configure(&GlobalConfig::default()).unwrap();
        assert_eq!(reg.chains()[1].config().shade_alpha, 0.9);
        assert!((reg.chains()[0].config().shade_alpha - 1.0 / 3.0).abs() < 1e-12);
    }
}
