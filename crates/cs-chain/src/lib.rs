//! # cs-chain
//!
//! Summarization engine for weighted sample sets ("chains") over a shared
//! parameter space.
//!
//! Clients register chains in a [`ChainRegistry`], apply a validated
//! [`GlobalConfig`] once via [`ChainRegistry::configure`], and then query:
//!
//! - [`AnalysisEngine`] for per-parameter credible intervals,
//! - [`GeometryEngine`] for shared axis extents across chains,
//! - [`diagnostics::gelman_rubin`] for cross-chain convergence checks.
//!
//! Engines read registry state and never mutate chains, except `configure`
//! writing each chain's resolved display configuration (colour, shade
//! alpha). Everything is synchronous and single-threaded; callers serialize
//! mutation against queries.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Chain entity and construction-time validation.
pub mod chain;
/// Configuration surface, validation and per-chain resolution.
pub mod config;
/// Marginal density estimation: kernel smoothing and lattice aggregation.
pub mod density;
/// Cross-chain Gelman-Rubin convergence diagnostic.
pub mod diagnostics;
/// Shared axis extents across heterogeneous chains.
pub mod extents;
/// Ordered chain registry with name/index resolution.
pub mod registry;
/// Credible-interval summaries per (chain, parameter).
pub mod summary;

pub use chain::{Chain, ChainSpec};
pub use config::{ChainConfig, ChainOverrides, ExtentsPolicy, GlobalConfig};
pub use density::{DensityCurve, DensityEstimator, KernelEstimator, LatticeAggregator};
pub use extents::GeometryEngine;
pub use registry::{ChainRef, ChainRegistry};
pub use summary::{AnalysisEngine, ChainSummary, MarginalSummary};
