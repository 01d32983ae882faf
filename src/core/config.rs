//! Configuration for GEX analytics
//!
//! Every default used by the components lives here and is passed by reference
//! into the component that needs it.

use serde::{Deserialize, Serialize};

use super::error::{GexError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GexConfig {
    /// Greeks engine inputs
    pub greeks: GreeksConfig,
    /// Caller-level filtering and view policy for the analyzer
    pub aggregation: AggregationConfig,
    /// Zero-gamma bisection
    pub zero_gamma: ZeroGammaConfig,
    /// Scenario shocks
    pub scenario: ScenarioConfig,
    /// Flow analytics thresholds
    pub flow: FlowConfig,
}

impl GexConfig {
    /// Wide settings: larger strike window and search bracket
    pub fn wide() -> Self {
        Self {
            aggregation: AggregationConfig {
                strike_window_pct: 0.25,
                cumulative_window_pct: 0.30,
                ..Default::default()
            },
            zero_gamma: ZeroGammaConfig {
                bounds_pct: (0.7, 1.3),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Narrow settings: tight window around spot, near-term expiries only
    pub fn narrow() -> Self {
        Self {
            aggregation: AggregationConfig {
                strike_window_pct: 0.08,
                cumulative_window_pct: 0.10,
                max_expiry_days: Some(60),
                ..Default::default()
            },
            zero_gamma: ZeroGammaConfig {
                bounds_pct: (0.9, 1.1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse a (possibly partial) JSON document; missing sections take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges of every section
    pub fn validate(&self) -> Result<()> {
        if !self.greeks.risk_free_rate.is_finite() {
            return Err(GexError::invalid_input("risk_free_rate must be finite"));
        }
        self.aggregation.validate()?;
        self.zero_gamma.validate()?;
        self.scenario.validate()?;
        self.flow.validate()
    }
}

/// Greeks engine inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeksConfig {
    /// Continuously compounded risk-free rate
    /// Default: 0.01
    pub risk_free_rate: f64,
}

impl Default for GreeksConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
        }
    }
}

/// Filtering policy applied by the analyzer before aggregating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Strike window (± fraction of spot) for by-strike, surface and moneyness views
    /// Default: 0.15
    pub strike_window_pct: f64,

    /// Strike window for the cumulative profile
    /// Default: 0.20
    pub cumulative_window_pct: f64,

    /// Drop expirations further out than this many days (None = keep all)
    /// Default: 365
    pub max_expiry_days: Option<i64>,

    /// Moneyness bin edges (strike / spot), strictly increasing
    pub moneyness_bins: Vec<f64>,

    /// Number of strikes reported on each side by `top_strikes`
    /// Default: 5
    pub top_n: usize,

    /// Horizon of the implied volatility profile, in days
    /// Default: 30
    pub iv_profile_days: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            strike_window_pct: 0.15,
            cumulative_window_pct: 0.20,
            max_expiry_days: Some(365),
            moneyness_bins: vec![0.8, 0.9, 1.0, 1.1, 1.2],
            top_n: 5,
            iv_profile_days: 30,
        }
    }
}

impl AggregationConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        for (name, pct) in [
            ("strike_window_pct", self.strike_window_pct),
            ("cumulative_window_pct", self.cumulative_window_pct),
        ] {
            if !(pct.is_finite() && pct > 0.0 && pct < 1.0) {
                return Err(GexError::invalid_input(format!(
                    "{name} must be in (0, 1), got {pct}"
                )));
            }
        }
        validate_bins(&self.moneyness_bins)
    }
}

/// Bin edges must be finite, at least two, and strictly increasing
pub fn validate_bins(bins: &[f64]) -> Result<()> {
    if bins.len() < 2 {
        return Err(GexError::invalid_input(
            "moneyness bins need at least two edges",
        ));
    }
    if bins.iter().any(|b| !b.is_finite()) {
        return Err(GexError::invalid_input("moneyness bin edges must be finite"));
    }
    if bins.windows(2).any(|w| w[1] <= w[0]) {
        return Err(GexError::invalid_input(
            "moneyness bin edges must be strictly increasing",
        ));
    }
    Ok(())
}

/// Zero-gamma bisection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroGammaConfig {
    /// Search bracket as fractions of spot: [spot × lo, spot × hi]
    /// Default: (0.8, 1.2)
    pub bounds_pct: (f64, f64),

    /// Stop once the bracket is narrower than spot × tolerance_pct
    /// Default: 1e-4
    pub tolerance_pct: f64,

    /// Iteration cap; hitting it is reported as non-convergence
    /// Default: 100
    pub max_iterations: usize,
}

impl Default for ZeroGammaConfig {
    fn default() -> Self {
        Self {
            bounds_pct: (0.8, 1.2),
            tolerance_pct: 1e-4,
            max_iterations: 100,
        }
    }
}

impl ZeroGammaConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let (lo, hi) = self.bounds_pct;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo < hi) {
            return Err(GexError::invalid_input(format!(
                "zero-gamma bounds must satisfy 0 < lower < upper, got ({lo}, {hi})"
            )));
        }
        if !(self.tolerance_pct.is_finite() && self.tolerance_pct > 0.0) {
            return Err(GexError::invalid_input("tolerance_pct must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(GexError::invalid_input("max_iterations must be at least 1"));
        }
        Ok(())
    }
}

/// Scenario shocks run by `scenario_all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Relative spot shifts (0.05 = +5%)
    pub spot_shifts: Vec<f64>,

    /// Absolute implied volatility shifts (0.05 = +5 vol points)
    pub vol_shifts: Vec<f64>,

    /// Calendar days to roll forward
    pub time_days: Vec<u32>,

    /// Lower clamp for shocked implied volatility
    /// Default: 1e-4
    pub vol_floor: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            spot_shifts: vec![-0.05, 0.05],
            vol_shifts: vec![-0.05, 0.05],
            time_days: vec![7, 14],
            vol_floor: 1e-4,
        }
    }
}

impl ScenarioConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.vol_floor.is_finite() && self.vol_floor > 0.0) {
            return Err(GexError::invalid_input("vol_floor must be positive"));
        }
        if let Some(shift) = self.spot_shifts.iter().find(|s| !(s.is_finite() && **s > -1.0)) {
            return Err(GexError::invalid_input(format!(
                "spot shift {shift} would make spot non-positive"
            )));
        }
        if self.vol_shifts.iter().any(|s| !s.is_finite()) {
            return Err(GexError::invalid_input("vol shifts must be finite"));
        }
        Ok(())
    }
}

/// Flow analytics thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Volume above threshold × open interest is unusual
    /// Default: 2.0
    pub unusual_volume_threshold: f64,

    /// Minimum contracts traded for a large trade
    /// Default: 100
    pub min_volume: u64,

    /// Minimum volume × strike × multiplier for a large trade
    /// Default: 1e6
    pub min_notional: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            unusual_volume_threshold: 2.0,
            min_volume: 100,
            min_notional: 1e6,
        }
    }
}

impl FlowConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.unusual_volume_threshold.is_finite() && self.unusual_volume_threshold >= 0.0) {
            return Err(GexError::invalid_input(
                "unusual_volume_threshold must be non-negative",
            ));
        }
        if !self.min_notional.is_finite() {
            return Err(GexError::invalid_input("min_notional must be finite"));
        }
        Ok(())
    }
}
