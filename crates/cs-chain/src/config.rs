//! Configuration surface, eager validation and per-chain resolution.
//!
//! A [`GlobalConfig`] is validated as a whole before any chain is touched,
//! then layered into an immutable [`ChainConfig`] snapshot per chain:
//! built-in defaults, then global settings, then the chain's own
//! [`ChainOverrides`], later layers winning.

use cs_core::{Error, Result, SummaryStatistic};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::extents::default_shade_alpha;

/// Default colour cycle, assigned to chains by registration order.
pub const PALETTE: [&str; 10] = [
    "#1E88E5", "#D32F2F", "#4CAF50", "#673AB7", "#FFC107", "#795548", "#64B5F6", "#8BC34A",
    "#757575", "#CDDC39",
];

/// Probability mass of the one-sigma interval of a normal distribution,
/// the default credible-interval mass.
pub const ONE_SIGMA_AREA: f64 = 0.682_689_492_137_086;

/// Policy for the per-chain axis span of a non-grid chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtentsPolicy {
    /// Weighted mean plus/minus `extent_sigma` weighted standard deviations.
    #[default]
    Sigma,
    /// Literal minimum and maximum over samples with positive weight.
    Extrema,
}

/// Registry-wide configuration, applied to every chain by
/// [`crate::ChainRegistry::configure`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Probability mass captured by reported credible intervals. Must be
    /// strictly inside `(0, 1)`.
    pub summary_area: f64,
    /// Interval convention used by the analysis engine.
    pub statistic: SummaryStatistic,
    /// Axis-span policy for non-grid chains.
    pub extents_policy: ExtentsPolicy,
    /// Standard-deviation multiple used by [`ExtentsPolicy::Sigma`].
    pub extent_sigma: f64,
    /// Number of evaluation points for kernel density estimation.
    pub grid_points: usize,
    /// Multiplier on the Scott's-rule kernel bandwidth.
    pub bandwidth_scale: f64,
    /// Shade opacity applied to every chain. `None` auto-balances to
    /// `1 / chain_count`.
    pub shade_alpha: Option<f64>,
    /// Colour cycle replacing the built-in palette.
    pub colors: Option<Vec<String>>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            summary_area: ONE_SIGMA_AREA,
            statistic: SummaryStatistic::default(),
            extents_policy: ExtentsPolicy::default(),
            extent_sigma: 3.1,
            grid_points: 4096,
            bandwidth_scale: 1.0,
            shade_alpha: None,
            colors: None,
        }
    }
}

impl GlobalConfig {
    /// Validate every field. Called by `configure` before any chain is
    /// mutated, so a failure leaves the registry untouched.
    pub fn validate(&self) -> Result<()> {
        validate_summary_area(self.summary_area)?;
        if !self.extent_sigma.is_finite() || self.extent_sigma <= 0.0 {
            return Err(Error::Validation(format!(
                "extent_sigma must be finite and > 0, got {}",
                self.extent_sigma
            )));
        }
        if self.grid_points < 16 {
            return Err(Error::Validation(format!(
                "grid_points must be at least 16, got {}",
                self.grid_points
            )));
        }
        if !self.bandwidth_scale.is_finite() || self.bandwidth_scale <= 0.0 {
            return Err(Error::Validation(format!(
                "bandwidth_scale must be finite and > 0, got {}",
                self.bandwidth_scale
            )));
        }
        if let Some(alpha) = self.shade_alpha {
            validate_shade_alpha(alpha)?;
        }
        if let Some(colors) = &self.colors {
            if colors.is_empty() {
                return Err(Error::Validation("colors must not be empty when given".into()));
            }
        }
        Ok(())
    }

    /// Credible-interval mass of a `sigma`-wide normal interval, e.g.
    /// `summary_area_from_sigma(1.0)` is approximately 0.6827.
    pub fn summary_area_from_sigma(sigma: f64) -> f64 {
        let n = Normal::new(0.0, 1.0).expect("standard normal should be constructible");
        2.0 * n.cdf(sigma.abs()) - 1.0
    }
}

/// Per-chain optional overrides, layered on top of the global configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainOverrides {
    /// Display colour (hex string).
    pub color: Option<String>,
    /// Shade opacity override, in `(0, 1]`.
    pub shade_alpha: Option<f64>,
    /// Interval-convention override.
    pub statistic: Option<SummaryStatistic>,
    /// Credible-interval mass override.
    pub summary_area: Option<f64>,
    /// Kernel evaluation-grid resolution override.
    pub grid_points: Option<usize>,
}

impl ChainOverrides {
    /// No overrides: the chain follows the global configuration.
    pub fn none() -> Self {
        Self::default()
    }

    /// Override the display colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Override the shade opacity.
    pub fn with_shade_alpha(mut self, alpha: f64) -> Self {
        self.shade_alpha = Some(alpha);
        self
    }

    /// Override the interval convention.
    pub fn with_statistic(mut self, statistic: SummaryStatistic) -> Self {
        self.statistic = Some(statistic);
        self
    }

    /// Override the credible-interval mass.
    pub fn with_summary_area(mut self, area: f64) -> Self {
        self.summary_area = Some(area);
        self
    }

    /// Override the kernel evaluation-grid resolution.
    pub fn with_grid_points(mut self, points: usize) -> Self {
        self.grid_points = Some(points);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(area) = self.summary_area {
            validate_summary_area(area)?;
        }
        if let Some(alpha) = self.shade_alpha {
            validate_shade_alpha(alpha)?;
        }
        if let Some(points) = self.grid_points {
            if points < 16 {
                return Err(Error::Validation(format!(
                    "grid_points override must be at least 16, got {points}"
                )));
            }
        }
        Ok(())
    }
}

/// Fully-resolved per-chain configuration snapshot, written into each chain
/// when the registry is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Display colour (hex string).
    pub color: String,
    /// Resolved shade opacity.
    pub shade_alpha: f64,
    /// Interval convention for this chain's summaries.
    pub statistic: SummaryStatistic,
    /// Credible-interval mass for this chain's summaries.
    pub summary_area: f64,
    /// Axis-span policy for this chain.
    pub extents_policy: ExtentsPolicy,
    /// Standard-deviation multiple for sigma extents.
    pub extent_sigma: f64,
    /// Kernel evaluation-grid resolution.
    pub grid_points: usize,
    /// Kernel bandwidth multiplier.
    pub bandwidth_scale: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::resolve(&GlobalConfig::default(), &ChainOverrides::default(), 0, 1)
    }
}

impl ChainConfig {
    /// Layer defaults, the global configuration and per-chain overrides into
    /// a resolved snapshot for the chain at `position` out of `chain_count`.
    ///
    /// Inputs are assumed validated; this step cannot fail.
    pub fn resolve(
        global: &GlobalConfig,
        overrides: &ChainOverrides,
        position: usize,
        chain_count: usize,
    ) -> Self {
        let color = overrides.color.clone().unwrap_or_else(|| match &global.colors {
            Some(cycle) => cycle[position % cycle.len()].clone(),
            None => PALETTE[position % PALETTE.len()].to_string(),
        });
        let shade_alpha = overrides
            .shade_alpha
            .or(global.shade_alpha)
            .unwrap_or_else(|| default_shade_alpha(chain_count));
        Self {
            color,
            shade_alpha,
            statistic: overrides.statistic.unwrap_or(global.statistic),
            summary_area: overrides.summary_area.unwrap_or(global.summary_area),
            extents_policy: global.extents_policy,
            extent_sigma: global.extent_sigma,
            grid_points: overrides.grid_points.unwrap_or(global.grid_points),
            bandwidth_scale: global.bandwidth_scale,
        }
    }
}

fn validate_summary_area(area: f64) -> Result<()> {
    if !area.is_finite() || area <= 0.0 || area >= 1.0 {
        return Err(Error::Validation(format!(
            "summary_area must be a finite number strictly between 0 and 1, got {area}"
        )));
    }
    Ok(())
}

fn validate_shade_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
        return Err(Error::Validation(format!(
            "shade_alpha must be in (0, 1], got {alpha}"
        )));
    }
    Ok(())
}
