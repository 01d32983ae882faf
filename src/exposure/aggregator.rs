//! Per-contract exposure and the aggregation views over a chain

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{
    CumulativeGex, ExpiryGex, GexResult, MoneynessBucket, StableSum, StrikeGex, WeightedMetrics,
    GEX_PER_PCT,
};
use crate::core::{validate_bins, Chain, Contract, GexError, OptionClass, Result};
use crate::models::contract_greeks_at;

/// Signed dollar gamma exposure of one contract at `spot`
pub fn contract_gex(contract: &Contract, gamma: f64, spot: f64) -> f64 {
    contract.option_class.gex_sign()
        * gamma
        * contract.open_interest as f64
        * contract.multiplier
        * spot
        * spot
        * GEX_PER_PCT
}

/// Gamma re-derived from implied volatility at `spot`.
///
/// A contract with no time left has nothing to re-derive and carries zero gamma,
/// but only once it is known to carry a volatility at all.
pub fn model_gamma(chain: &Chain, contract: &Contract, spot: f64, rate: f64) -> Result<f64> {
    if contract.implied_vol.is_none() {
        return Err(GexError::invalid_input(format!(
            "{} {} {} {}: no gamma supplied and no implied volatility to derive it from",
            contract.underlying,
            contract.expiration,
            contract.strike,
            contract.option_class.label()
        )));
    }
    if chain.time_to_expiry(contract) <= 0.0 {
        return Ok(0.0);
    }
    Ok(contract_greeks_at(chain, contract, spot, rate)?.gamma)
}

/// Gamma at the chain's own spot: supplied value first, model otherwise
pub fn resolve_gamma(chain: &Chain, contract: &Contract, rate: f64) -> Result<f64> {
    match contract.gamma {
        Some(gamma) => Ok(gamma),
        None => model_gamma(chain, contract, chain.spot(), rate),
    }
}

/// Gamma at a hypothetical spot.
///
/// Contracts with implied volatility are re-priced at `spot`; a supplied
/// gamma without volatility can only be held fixed.
pub fn gamma_at_spot(chain: &Chain, contract: &Contract, spot: f64, rate: f64) -> Result<f64> {
    match (contract.implied_vol, contract.gamma) {
        (None, Some(gamma)) => Ok(gamma),
        _ => model_gamma(chain, contract, spot, rate),
    }
}

/// Resolved gamma for every contract, aligned to chain order
pub fn resolve_gammas(chain: &Chain, rate: f64) -> Result<Vec<f64>> {
    chain
        .contracts()
        .iter()
        .map(|c| resolve_gamma(chain, c, rate))
        .collect()
}

/// Signed exposure of every contract at the chain's spot, aligned to chain order
pub fn contract_exposures(chain: &Chain, rate: f64) -> Result<Vec<f64>> {
    let spot = chain.spot();
    chain
        .contracts()
        .iter()
        .map(|c| Ok(contract_gex(c, resolve_gamma(chain, c, rate)?, spot)))
        .collect()
}

/// Sum call and put exposure at `spot`, taking each contract's gamma from `gamma_of`
///
/// Shared by the plain total, the zero-gamma objective and every scenario, so the
/// sign convention and scaling live in one place.
pub fn aggregate_with<F>(chain: &Chain, spot: f64, mut gamma_of: F) -> Result<GexResult>
where
    F: FnMut(usize, &Contract) -> Result<Option<f64>>,
{
    let mut calls = StableSum::default();
    let mut puts = StableSum::default();

    for (i, contract) in chain.contracts().iter().enumerate() {
        // None: contract sits out of this evaluation
        let Some(gamma) = gamma_of(i, contract)? else {
            continue;
        };
        let gex = contract_gex(contract, gamma, spot);
        match contract.option_class {
            OptionClass::Call => calls.add(gex),
            OptionClass::Put => puts.add(gex),
        }
    }

    Ok(GexResult::new(
        calls.value(),
        puts.value(),
        spot,
        chain.timestamp(),
    ))
}

/// Total, call and put exposure at the chain's spot
pub fn calculate_total_gex(chain: &Chain, rate: f64) -> Result<GexResult> {
    chain.require_non_empty("calculate_total_gex")?;
    aggregate_with(chain, chain.spot(), |_, c| resolve_gamma(chain, c, rate).map(Some))
}

/// Net total exposure with spot replaced by `spot` and gamma re-derived where possible
pub fn total_gex_at_spot(chain: &Chain, spot: f64, rate: f64) -> Result<f64> {
    let result = aggregate_with(chain, spot, |_, c| gamma_at_spot(chain, c, spot, rate).map(Some))?;
    Ok(result.total_gex)
}

/// Exposure per strike, ascending; equal strikes across expiries are merged
pub fn calculate_gex_by_strike(chain: &Chain, rate: f64) -> Result<Vec<StrikeGex>> {
    let exposures = contract_exposures(chain, rate)?;
    Ok(group_by_strike(chain.contracts(), &exposures))
}

fn group_by_strike(contracts: &[Contract], exposures: &[f64]) -> Vec<StrikeGex> {
    let mut order: Vec<usize> = (0..contracts.len()).collect();
    order.sort_by(|&a, &b| contracts[a].strike.total_cmp(&contracts[b].strike));

    let mut rows: Vec<StrikeGex> = Vec::new();
    let mut i = 0;
    while i < order.len() {
        let strike = contracts[order[i]].strike;
        let mut calls = StableSum::default();
        let mut puts = StableSum::default();

        while i < order.len() && contracts[order[i]].strike == strike {
            let idx = order[i];
            match contracts[idx].option_class {
                OptionClass::Call => calls.add(exposures[idx]),
                OptionClass::Put => puts.add(exposures[idx]),
            }
            i += 1;
        }

        let (call_gex, put_gex) = (calls.value(), puts.value());
        rows.push(StrikeGex {
            strike,
            call_gex,
            put_gex,
            net_gex: call_gex + put_gex,
        });
    }

    rows
}

/// Exposure per expiration, ascending by date
pub fn calculate_gex_by_expiry(chain: &Chain, rate: f64) -> Result<Vec<ExpiryGex>> {
    let exposures = contract_exposures(chain, rate)?;
    let mut by_expiry: BTreeMap<NaiveDate, (StableSum, StableSum)> = BTreeMap::new();

    for (contract, gex) in chain.contracts().iter().zip(&exposures) {
        let entry = by_expiry.entry(contract.expiration).or_default();
        match contract.option_class {
            OptionClass::Call => entry.0.add(*gex),
            OptionClass::Put => entry.1.add(*gex),
        }
    }

    let snapshot = chain.snapshot_date();
    Ok(by_expiry
        .into_iter()
        .map(|(expiration, (calls, puts))| {
            let (call_gex, put_gex) = (calls.value(), puts.value());
            ExpiryGex {
                expiration,
                days_to_expiry: (expiration - snapshot).num_days(),
                call_gex,
                put_gex,
                net_gex: call_gex + put_gex,
            }
        })
        .collect())
}

/// Net exposure bucketed by strike / spot into right-closed bins `(lo, hi]`
///
/// Every bucket is reported, with zero exposure when nothing falls in it.
/// Contracts outside the outermost edges are ignored.
pub fn compute_gex_by_moneyness(
    chain: &Chain,
    bins: &[f64],
    rate: f64,
) -> Result<Vec<MoneynessBucket>> {
    validate_bins(bins)?;
    let exposures = contract_exposures(chain, rate)?;
    let spot = chain.spot();

    let mut sums = vec![StableSum::default(); bins.len() - 1];
    let mut counts = vec![0usize; bins.len() - 1];

    for (contract, gex) in chain.contracts().iter().zip(&exposures) {
        let m = contract.moneyness(spot);
        if let Some(b) = bins.windows(2).position(|w| m > w[0] && m <= w[1]) {
            sums[b].add(*gex);
            counts[b] += 1;
        }
    }

    Ok(bins
        .windows(2)
        .zip(sums.iter().zip(&counts))
        .map(|(w, (sum, &contracts))| MoneynessBucket {
            lower: w[0],
            upper: w[1],
            net_gex: sum.value(),
            contracts,
        })
        .collect())
}

/// Running sum of per-strike net exposure, strikes ascending
pub fn compute_cumulative_gex(chain: &Chain, rate: f64) -> Result<Vec<CumulativeGex>> {
    Ok(cumulate(&calculate_gex_by_strike(chain, rate)?))
}

pub(crate) fn cumulate(by_strike: &[StrikeGex]) -> Vec<CumulativeGex> {
    let mut running = StableSum::default();
    by_strike
        .iter()
        .map(|row| {
            running.add(row.net_gex);
            CumulativeGex {
                strike: row.strike,
                net_gex: row.net_gex,
                cumulative_gex: running.value(),
            }
        })
        .collect()
}

/// |GEX|-weighted strike and days to expiry
///
/// With no exposure at all both metrics are NaN rather than a division by zero.
pub fn compute_weighted_metrics(chain: &Chain, rate: f64) -> Result<WeightedMetrics> {
    let exposures = contract_exposures(chain, rate)?;

    let mut total = StableSum::default();
    let mut strike_weighted = StableSum::default();
    let mut days_weighted = StableSum::default();

    for (contract, gex) in chain.contracts().iter().zip(&exposures) {
        let weight = gex.abs();
        let days = chain.days_to_expiry(contract).max(0) as f64;
        total.add(weight);
        strike_weighted.add(contract.strike * weight);
        days_weighted.add(days * weight);
    }

    let total_abs_gex = total.value();
    if total_abs_gex == 0.0 {
        return Ok(WeightedMetrics::empty());
    }

    Ok(WeightedMetrics {
        weighted_strike: strike_weighted.value() / total_abs_gex,
        weighted_expiry_days: days_weighted.value() / total_abs_gex,
        total_abs_gex,
    })
}

impl WeightedMetrics {
    /// Sentinel for a chain with no exposure to weight by
    pub fn empty() -> Self {
        Self {
            weighted_strike: f64::NAN,
            weighted_expiry_days: f64::NAN,
            total_abs_gex: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_abs_gex == 0.0
    }

    /// Turn the NaN sentinel into an [`GexError::EmptyAggregation`] for callers
    /// that cannot use it
    pub fn require_non_empty(&self) -> Result<&Self> {
        if self.is_empty() {
            Err(GexError::empty_aggregation(
                "weighted metrics over a chain with zero total |GEX|",
            ))
        } else {
            Ok(self)
        }
    }
}
