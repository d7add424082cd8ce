//! Common data types for chainscope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Three-point marginal summary: credible-interval bounds plus a central
/// value, all in parameter units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibleInterval {
    /// Lower bound of the credible interval.
    pub lower: f64,
    /// Central value. The density mode, median or bound midpoint depending
    /// on the [`SummaryStatistic`] that produced the interval.
    pub central: f64,
    /// Upper bound of the credible interval.
    pub upper: f64,
}

impl CredibleInterval {
    /// Interval for a degenerate (zero-variance) marginal: all three points
    /// collapse onto the single observed value.
    pub fn point(value: f64) -> Self {
        Self { lower: value, central: value, upper: value }
    }

    /// True when the interval has collapsed to a single value.
    pub fn is_degenerate(&self) -> bool {
        self.lower == self.upper
    }

    /// Half of the interval width.
    pub fn half_width(&self) -> f64 {
        0.5 * (self.upper - self.lower)
    }
}

/// Convention used to place a credible interval of a given probability mass
/// on a 1D marginal density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStatistic {
    /// Shortest interval enclosing the target mass; the central value is the
    /// density mode. Ties between equal-width intervals break leftmost.
    #[default]
    Shortest,
    /// Bounds at cumulative probability `0.5 ± area/2`; the central value is
    /// the median.
    CentralPercentile,
    /// Same percentile bounds, but the central value is the midpoint of the
    /// two bounds.
    Symmetric,
}

impl fmt::Display for SummaryStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryStatistic::Shortest => write!(f, "shortest"),
            SummaryStatistic::CentralPercentile => write!(f, "central-percentile"),
            SummaryStatistic::Symmetric => write!(f, "symmetric"),
        }
    }
}

impl FromStr for SummaryStatistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" => Ok(SummaryStatistic::Shortest),
            "central-percentile" => Ok(SummaryStatistic::CentralPercentile),
            "symmetric" => Ok(SummaryStatistic::Symmetric),
            other => Err(Error::Validation(format!(
                "unknown summary statistic {other:?}; expected shortest, \
                 central-percentile or symmetric"
            ))),
        }
    }
}
