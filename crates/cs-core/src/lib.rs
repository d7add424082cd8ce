//! # cs-core
//!
//! Shared types and error taxonomy for chainscope.
//!
//! Everything here is consumed by the engine crate (`cs-chain`) and the
//! artifact crate (`cs-viz`); this crate itself stays dependency-light.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{CredibleInterval, SummaryStatistic};

/// Crate version, stamped into renderer-facing artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
