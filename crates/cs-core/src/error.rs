//! Error types for chainscope.

use thiserror::Error;

/// chainscope error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed configuration or input shapes. Fatal for the offending
    /// call; no partial mutation is left behind.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unresolvable chain reference or unknown parameter. Aborts only the
    /// query that raised it.
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Internal numeric failure that could not be recovered locally.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
