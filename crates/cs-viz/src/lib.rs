//! # cs-viz
//!
//! Visualization data artifacts for chainscope.
//!
//! This crate is intentionally dependency-light and focuses on emitting
//! plot-friendly JSON structures (arrays instead of nested objects). It does
//! no drawing; a rendering layer consumes the artifacts.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Marginal-distribution artifact: per-chain density polylines, interval
/// bounds and shared axis extents.
pub mod marginals;

pub use marginals::{marginals_artifact, ChainSeries, MarginalSeries, MarginalsArtifact};
