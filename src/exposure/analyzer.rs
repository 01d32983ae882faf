//! GexAnalyzer - one-call facade over the aggregation views
//!
//! Applies the configured filtering policy, runs every view and the zero-gamma
//! search, and collects the results into a [`GexReport`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    calculate_gex_by_expiry, calculate_gex_by_strike, calculate_gex_surface, calculate_total_gex,
    compute_gex_by_moneyness, compute_weighted_metrics, cumulate, dominant_expiry,
    find_flip_points, iv_profile, top_strikes, CumulativeGex, ExpiryGex, GexResult, GexSurface,
    IvPoint, MoneynessBucket, StrikeGex, TopStrikes, WeightedMetrics,
};
use crate::core::{Chain, GexConfig, Result};
use crate::solver::{find_zero_gamma, ZeroGammaStatus};

/// Everything the analyzer derives from one chain snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GexReport {
    pub underlying: String,
    pub spot_price: f64,
    pub timestamp: DateTime<Utc>,
    /// Unfiltered total
    pub total: GexResult,
    /// Within the strike window and expiry horizon
    pub by_strike: Vec<StrikeGex>,
    /// Within the expiry horizon
    pub by_expiry: Vec<ExpiryGex>,
    /// Within the strike window and expiry horizon
    pub surface: GexSurface,
    /// Within the cumulative window and expiry horizon
    pub cumulative: Vec<CumulativeGex>,
    pub moneyness: Vec<MoneynessBucket>,
    pub weighted: WeightedMetrics,
    pub top_strikes: TopStrikes,
    pub flip_points: Vec<f64>,
    pub dominant_expiry: Option<NaiveDate>,
    pub iv_profile: Vec<IvPoint>,
    pub zero_gamma: ZeroGammaStatus,
}

impl GexReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs the full aggregation pipeline with one configuration
#[derive(Debug, Clone, Default)]
pub struct GexAnalyzer {
    config: GexConfig,
}

impl GexAnalyzer {
    /// Create a new analyzer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: GexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GexConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GexConfig) {
        self.config = config;
    }

    /// Analyze one chain snapshot
    ///
    /// Fails on an empty chain, an invalid configuration, or a contract whose
    /// gamma cannot be resolved. A zero-gamma search that finds no level is
    /// reported in [`GexReport::zero_gamma`], not as an error.
    pub fn analyze(&self, chain: &Chain) -> Result<GexReport> {
        self.config.validate()?;
        let agg = &self.config.aggregation;
        let rate = self.config.greeks.risk_free_rate;

        debug!(
            underlying = chain.underlying(),
            spot = chain.spot(),
            contracts = chain.len(),
            "analyzing chain"
        );

        let total = calculate_total_gex(chain, rate)?;

        let horizon = match agg.max_expiry_days {
            Some(days) => chain.within_days(days),
            None => chain.clone(),
        };
        let windowed = horizon.within_strike_window(agg.strike_window_pct);
        debug!(
            in_horizon = horizon.len(),
            in_window = windowed.len(),
            "applied expiry horizon and strike window"
        );

        let by_strike = calculate_gex_by_strike(&windowed, rate)?;
        let by_expiry = calculate_gex_by_expiry(&horizon, rate)?;
        let surface = calculate_gex_surface(&windowed, rate)?;
        let moneyness = compute_gex_by_moneyness(&windowed, &agg.moneyness_bins, rate)?;
        let cumulative = cumulate(&calculate_gex_by_strike(
            &horizon.within_strike_window(agg.cumulative_window_pct),
            rate,
        )?);
        let weighted = compute_weighted_metrics(&horizon, rate)?;

        let zero_gamma =
            ZeroGammaStatus::from_result(find_zero_gamma(chain, &self.config.zero_gamma, rate))?;

        let report = GexReport {
            underlying: chain.underlying().to_string(),
            spot_price: chain.spot(),
            timestamp: chain.timestamp(),
            total,
            top_strikes: top_strikes(&by_strike, agg.top_n),
            flip_points: find_flip_points(&by_strike),
            dominant_expiry: dominant_expiry(&by_expiry),
            iv_profile: iv_profile(chain, agg.iv_profile_days, agg.strike_window_pct),
            by_strike,
            by_expiry,
            surface,
            cumulative,
            moneyness,
            weighted,
            zero_gamma,
        };

        debug!(
            total_gex = report.total.total_gex,
            zero_gamma = ?report.zero_gamma.price(),
            flips = report.flip_points.len(),
            "analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Contract, GexError};
    use chrono::TimeZone;

    fn chain() -> Chain {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        Chain::new(
            "SPX",
            100.0,
            Utc.with_ymd_and_hms(2025, 1, 2, 15, 0, 0).unwrap(),
            vec![
                Contract::put("SPX", 90.0, d(2, 1)).with_open_interest(1000).with_iv(0.2),
                Contract::put("SPX", 95.0, d(2, 1)).with_open_interest(800).with_iv(0.2),
                Contract::call("SPX", 105.0, d(2, 1)).with_open_interest(800).with_iv(0.2),
                Contract::call("SPX", 110.0, d(2, 1)).with_open_interest(1000).with_iv(0.2),
                // outside the ±15% window but inside ±20%
                Contract::call("SPX", 118.0, d(2, 1)).with_open_interest(500).with_iv(0.2),
                // beyond the one-year horizon
                Contract::call("SPX", 100.0, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap())
                    .with_open_interest(50)
                    .with_iv(0.2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_analyze_applies_policy() {
        let report = GexAnalyzer::new().analyze(&chain()).unwrap();

        assert_eq!(report.underlying, "SPX");
        let strikes: Vec<f64> = report.by_strike.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![90.0, 95.0, 105.0, 110.0]);
        assert_eq!(report.cumulative.len(), 5);
        assert_eq!(report.by_expiry.len(), 1);
        assert_eq!(report.surface.dim(), (4, 1));
        assert_eq!(report.moneyness.len(), 4);

        // The total ignores the policy
        let far_call_included = report.total.call_gex
            > report.by_strike.iter().map(|r| r.call_gex).sum::<f64>();
        assert!(far_call_included);

        assert_eq!(report.flip_points.len(), 1);
        assert!(report.flip_points[0] > 95.0 && report.flip_points[0] < 105.0);
        assert!(report.zero_gamma.price().is_some());
        assert!(report.to_json().unwrap().contains("\"zero_gamma\""));
    }

    #[test]
    fn test_one_sided_chain_reports_status() {
        let calls = chain().filter(|c| c.option_class.is_call());
        let report = GexAnalyzer::new().analyze(&calls).unwrap();
        assert!(matches!(report.zero_gamma, ZeroGammaStatus::NotBracketed { .. }));
        assert!(report.flip_points.is_empty());
        assert!(report.top_strikes.negative.is_empty());
    }

    #[test]
    fn test_empty_chain_and_bad_config() {
        let empty = chain().filter(|_| false);
        assert!(matches!(
            GexAnalyzer::new().analyze(&empty),
            Err(GexError::InvalidInput(_))
        ));

        let mut analyzer = GexAnalyzer::new();
        let mut config = GexConfig::default();
        config.aggregation.moneyness_bins = vec![1.0, 0.9];
        analyzer.set_config(config);
        assert!(analyzer.analyze(&chain()).is_err());
    }
}
