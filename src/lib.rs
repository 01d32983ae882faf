//! # GEX Engine - Dealer Gamma Exposure Analytics
//!
//! Turns an option chain snapshot into the gamma exposure views used to reason
//! about dealer hedging flows.
//!
//! ## Overview
//!
//! For every contract:
//!
//! `GEX = ±gamma × open_interest × multiplier × spot² × 0.01`
//!
//! the dollar change in dealer delta for a 1% move, calls positive and puts
//! negative. Positive net GEX means hedging dampens moves; negative amplifies them.
//!
//! ## Key Components
//!
//! - **Greeks**: Black-Scholes first and second order Greeks (gamma derived from IV when absent)
//! - **Exposure**: total, per strike, per expiry, strike × expiry surface, moneyness,
//!   cumulative and weighted views, plus key levels
//! - **Solver**: zero-gamma level by bisection
//! - **Scenarios**: spot, volatility and time-decay shocks
//! - **Flow**: open interest changes, volume vs OI, large trades
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gex_engine::prelude::*;
//!
//! # fn main() -> gex_engine::Result<()> {
//! let json = std::fs::read_to_string("chain.json")
//!     .map_err(|e| GexError::invalid_input(e.to_string()))?;
//! let chain = Chain::from_json(&json)?;
//!
//! let report = GexAnalyzer::new().analyze(&chain)?;
//! println!("net GEX: {:.3e}", report.total.total_gex);
//! if let Some(level) = report.zero_gamma.price() {
//!     println!("zero gamma at {level:.2}");
//! }
//!
//! let scenarios = scenario_all(&chain, &ScenarioConfig::default(), 0.01)?;
//! println!("{} scenarios", scenarios.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## What This Does NOT Do
//!
//! - Fetch market data or persist results
//! - Model dividends or early exercise
//! - Know actual dealer positioning (the call-long / put-short convention is assumed)

pub mod core;
pub mod exposure;
pub mod flow;
pub mod models;
pub mod scenarios;
pub mod solver;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        AggregationConfig, Chain, ChainGreeks, Contract, ContractKey, FlowConfig, GexConfig,
        GexError, Greeks, GreeksConfig, OptionClass, Result, ScenarioConfig, ZeroGammaConfig,
    };

    // Greeks
    pub use crate::models::{compute_greeks, compute_option_greeks, norm_cdf, norm_pdf};

    // Exposure
    pub use crate::exposure::{
        calculate_gex_by_expiry, calculate_gex_by_strike, calculate_gex_surface,
        calculate_total_gex, compute_cumulative_gex, compute_gex_by_moneyness,
        compute_weighted_metrics, dominant_expiry, find_flip_points, iv_profile, top_strikes,
        CumulativeGex, ExpiryGex, GexAnalyzer, GexReport, GexResult, GexSurface, MoneynessBucket,
        StrikeGex, TopStrikes, WeightedMetrics,
    };

    // Zero gamma
    pub use crate::solver::{bisect, find_zero_gamma, RootOutcome, ZeroGammaPoint, ZeroGammaStatus};

    // Scenarios
    pub use crate::scenarios::{
        scenario_all, scenario_spot_shock, scenario_time_decay, scenario_vol_shock,
        ScenarioEntry, ScenarioKind, ScenarioResult, SpotShock,
    };

    // Flow
    pub use crate::flow::{
        aggregate_flow_metrics, analyze_flow, analyze_volume_vs_oi, compare_oi_changes,
        track_large_trades, FlowMetrics, FlowReport, LargeTrade, OiComparison, VolumeOiRow,
    };
}

// Re-export main types at crate root
pub use crate::core::{Chain, Contract, GexConfig, GexError, OptionClass, Result};
pub use crate::exposure::{GexAnalyzer, GexReport, GexResult};
