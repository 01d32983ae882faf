//! What-if exposure under spot, volatility and calendar shocks
//!
//! Every scenario starts from the unmodified base chain:
//! - **Spot**: gamma resolved once at the base spot and held fixed, only S² moves
//! - **Vol**: implied volatility shifted (floored), gamma re-derived at the base spot
//! - **Time**: the clock rolled forward, gamma re-derived, expired contracts drop out

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Chain, Contract, GexError, Result, ScenarioConfig, DAYS_PER_YEAR};
use crate::exposure::{aggregate_with, calculate_total_gex, resolve_gammas, GexResult};
use crate::models::compute_greeks;

/// Which input a scenario shocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Spot,
    Vol,
    Time,
}

/// Exposure after a spot move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotShock {
    pub new_spot: f64,
    pub gex: GexResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub kind: ScenarioKind,
    /// Relative spot shift, absolute vol shift, or days forward
    pub parameter: f64,
    /// Spot the scenario was evaluated at
    pub spot: f64,
    pub gex: GexResult,
}

/// Base exposure plus every configured scenario, keyed by name
/// (`spot_+5.0%`, `vol_-5.0%`, `time_7d`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub base: GexResult,
    pub scenarios: BTreeMap<String, ScenarioEntry>,
}

impl ScenarioResult {
    pub fn get(&self, name: &str) -> Option<&ScenarioEntry> {
        self.scenarios.get(name)
    }

    /// Change in net exposure versus the base for one scenario
    pub fn delta_vs_base(&self, name: &str) -> Option<f64> {
        self.get(name).map(|e| e.gex.total_gex - self.base.total_gex)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn require_iv(contract: &Contract, scenario: &str) -> Result<f64> {
    contract.implied_vol.ok_or_else(|| {
        GexError::invalid_input(format!(
            "{scenario}: {} {} {} {} has no implied volatility to re-price",
            contract.underlying,
            contract.expiration,
            contract.strike,
            contract.option_class.label()
        ))
    })
}

/// Net exposure after moving spot by `shift_pct` (0.05 = +5%)
///
/// Gamma is taken at the base spot, so only the S² scaling moves.
pub fn scenario_spot_shock(chain: &Chain, shift_pct: f64, rate: f64) -> Result<SpotShock> {
    chain.require_non_empty("scenario_spot_shock")?;
    let new_spot = chain.spot() * (1.0 + shift_pct);
    if !(new_spot.is_finite() && new_spot > 0.0) {
        return Err(GexError::invalid_input(format!(
            "spot shift {shift_pct} leaves a non-positive spot"
        )));
    }

    let gammas = resolve_gammas(chain, rate)?;
    let gex = aggregate_with(chain, new_spot, |i, _| Ok(Some(gammas[i])))?;
    debug!(shift_pct, new_spot, total_gex = gex.total_gex, "spot shock");

    Ok(SpotShock { new_spot, gex })
}

/// Net exposure after shifting every implied volatility by `vol_shift`
///
/// Shifted volatility is clamped at `config.vol_floor`. Every unexpired contract
/// needs implied volatility.
pub fn scenario_vol_shock(
    chain: &Chain,
    vol_shift: f64,
    config: &ScenarioConfig,
    rate: f64,
) -> Result<GexResult> {
    chain.require_non_empty("scenario_vol_shock")?;
    if !vol_shift.is_finite() {
        return Err(GexError::invalid_input("vol shift must be finite"));
    }

    let spot = chain.spot();
    let gex = aggregate_with(chain, spot, |_, c| {
        let time = chain.time_to_expiry(c);
        if time <= 0.0 {
            return Ok(None);
        }
        let vol = (require_iv(c, "scenario_vol_shock")? + vol_shift).max(config.vol_floor);
        Ok(Some(compute_greeks(spot, c.strike, time, rate, vol, c.option_class)?.gamma))
    })?;
    debug!(vol_shift, total_gex = gex.total_gex, "vol shock");

    Ok(gex)
}

/// Net exposure `days_forward` calendar days from the snapshot
///
/// Contracts that expire by then contribute nothing; the rest are re-priced
/// with their remaining time. The result is stamped with the advanced time.
pub fn scenario_time_decay(chain: &Chain, days_forward: u32, rate: f64) -> Result<GexResult> {
    chain.require_non_empty("scenario_time_decay")?;

    let spot = chain.spot();
    let mut expired = 0usize;
    let mut gex = aggregate_with(chain, spot, |_, c| {
        let days_left = chain.days_to_expiry(c) - i64::from(days_forward);
        if days_left <= 0 {
            expired += 1;
            return Ok(None);
        }
        let time = days_left as f64 / DAYS_PER_YEAR;
        let vol = require_iv(c, "scenario_time_decay")?;
        Ok(Some(compute_greeks(spot, c.strike, time, rate, vol, c.option_class)?.gamma))
    })?;
    gex.timestamp = chain.timestamp() + Duration::days(i64::from(days_forward));
    debug!(days_forward, expired, total_gex = gex.total_gex, "time decay");

    Ok(gex)
}

/// Run every configured shock independently against the base chain
pub fn scenario_all(chain: &Chain, config: &ScenarioConfig, rate: f64) -> Result<ScenarioResult> {
    config.validate()?;
    let base = calculate_total_gex(chain, rate)?;
    let spot = chain.spot();
    debug!(
        underlying = chain.underlying(),
        spot_shifts = config.spot_shifts.len(),
        vol_shifts = config.vol_shifts.len(),
        time_steps = config.time_days.len(),
        "running scenarios"
    );

    let mut scenarios = BTreeMap::new();

    for &shift in &config.spot_shifts {
        let shock = scenario_spot_shock(chain, shift, rate)?;
        scenarios.insert(
            format!("spot_{:+.1}%", shift * 100.0),
            ScenarioEntry {
                kind: ScenarioKind::Spot,
                parameter: shift,
                spot: shock.new_spot,
                gex: shock.gex,
            },
        );
    }

    for &shift in &config.vol_shifts {
        scenarios.insert(
            format!("vol_{:+.1}%", shift * 100.0),
            ScenarioEntry {
                kind: ScenarioKind::Vol,
                parameter: shift,
                spot,
                gex: scenario_vol_shock(chain, shift, config, rate)?,
            },
        );
    }

    for &days in &config.time_days {
        scenarios.insert(
            format!("time_{days}d"),
            ScenarioEntry {
                kind: ScenarioKind::Time,
                parameter: f64::from(days),
                spot,
                gex: scenario_time_decay(chain, days, rate)?,
            },
        );
    }

    Ok(ScenarioResult { base, scenarios })
}
