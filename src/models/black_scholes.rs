//! Black-Scholes Greeks
//!
//! Provides:
//! - Closed-form first and second order Greeks for a single contract
//! - A columnar variant over a whole chain
//!
//! No dividend yield is modelled. Theta, charm and color are reported per
//! calendar day; everything else is in natural units.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

use crate::core::{
    Chain, ChainGreeks, Contract, GexError, Greeks, OptionClass, Result, DAYS_PER_YEAR,
};

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GexError::invalid_input(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

/// Black-Scholes Greeks for one contract
///
/// Non-positive spot, strike, time or volatility is rejected with
/// [`GexError::InvalidInput`] before any logarithm or division happens.
pub fn compute_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    vol: f64,
    option_class: OptionClass,
) -> Result<Greeks> {
    check_positive("spot", spot)?;
    check_positive("strike", strike)?;
    check_positive("time_to_expiry", time_to_expiry)?;
    check_positive("volatility", vol)?;
    if !rate.is_finite() {
        return Err(GexError::invalid_input(format!(
            "risk-free rate must be finite, got {rate}"
        )));
    }

    let time = time_to_expiry;
    let sqrt_t = time.sqrt();
    let vol_sqrt_t = vol * sqrt_t;
    let d1 = d1(spot, strike, rate, vol, time);
    let d2 = d1 - vol_sqrt_t;
    let df = (-rate * time).exp();
    let pdf_d1 = norm_pdf(d1);

    let delta = match option_class {
        OptionClass::Call => norm_cdf(d1),
        OptionClass::Put => norm_cdf(d1) - 1.0,
    };

    // Same for call and put
    let gamma = pdf_d1 / (spot * vol_sqrt_t);
    let vega = spot * pdf_d1 * sqrt_t;

    let decay = -spot * pdf_d1 * vol / (2.0 * sqrt_t);
    let theta = match option_class {
        OptionClass::Call => decay - rate * strike * df * norm_cdf(d2),
        OptionClass::Put => decay + rate * strike * df * norm_cdf(-d2),
    };

    let rho = match option_class {
        OptionClass::Call => strike * time * df * norm_cdf(d2),
        OptionClass::Put => -strike * time * df * norm_cdf(-d2),
    };

    // Without carry, call and put charm coincide (their deltas differ by a constant)
    let charm = -pdf_d1 * (2.0 * rate * time - d2 * vol_sqrt_t) / (2.0 * time * vol_sqrt_t);

    let vanna = -pdf_d1 * d2 / vol;

    let speed = -gamma / spot * (d1 / vol_sqrt_t + 1.0);

    let color =
        -gamma / (2.0 * time) * (1.0 + d1 * (2.0 * rate * time - d2 * vol_sqrt_t) / vol_sqrt_t);

    Ok(Greeks {
        delta,
        gamma,
        theta: theta / DAYS_PER_YEAR,
        vega,
        rho,
        charm: charm / DAYS_PER_YEAR,
        vanna,
        speed,
        color: color / DAYS_PER_YEAR,
    })
}

/// Greeks of one chain contract at `spot`, using its own time to expiry and IV
pub fn contract_greeks_at(
    chain: &Chain,
    contract: &Contract,
    spot: f64,
    rate: f64,
) -> Result<Greeks> {
    let vol = contract.implied_vol.ok_or_else(|| {
        GexError::invalid_input(format!(
            "{} {} {} {}: implied volatility is required to compute Greeks",
            contract.underlying,
            contract.expiration,
            contract.strike,
            contract.option_class.label()
        ))
    })?;
    compute_greeks(
        spot,
        contract.strike,
        chain.time_to_expiry(contract),
        rate,
        vol,
        contract.option_class,
    )
}

/// Greeks for every contract of the chain at the chain's spot
///
/// Each row is exactly what [`compute_greeks`] returns for that contract; the
/// first contract that cannot be priced aborts the batch.
pub fn compute_option_greeks(chain: &Chain, rate: f64) -> Result<ChainGreeks> {
    let mut columns = ChainGreeks::with_capacity(chain.len());
    for (i, contract) in chain.contracts().iter().enumerate() {
        let greeks = contract_greeks_at(chain, contract, chain.spot(), rate)
            .map_err(|e| GexError::invalid_input(format!("contract #{i}: {e}")))?;
        columns.push(&greeks);
    }
    Ok(columns)
}
