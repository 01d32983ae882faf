//! Zero-gamma level: the spot at which net GEX changes sign

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{try_bisect, RootOutcome};
use crate::core::{Chain, GexError, Result, ZeroGammaConfig};
use crate::exposure::total_gex_at_spot;

/// Located zero-gamma level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZeroGammaPoint {
    /// Spot at which net GEX is zero
    pub price: f64,
    /// Net GEX at `price`
    pub residual: f64,
    pub iterations: usize,
    /// Search bracket actually used
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Find the spot in `[S × lo, S × hi]` where net GEX crosses zero
///
/// Contracts with implied volatility have their gamma re-derived at every trial
/// spot; contracts with only a supplied gamma keep it. Fails with
/// [`GexError::UnboundedRoot`] if net GEX has the same sign at both bounds and
/// [`GexError::NonConvergence`] if the iteration cap is hit first.
pub fn find_zero_gamma(
    chain: &Chain,
    config: &ZeroGammaConfig,
    rate: f64,
) -> Result<ZeroGammaPoint> {
    config.validate()?;
    chain.require_non_empty("find_zero_gamma")?;

    let spot = chain.spot();
    let (lower, upper) = (spot * config.bounds_pct.0, spot * config.bounds_pct.1);
    let tolerance = spot * config.tolerance_pct;

    debug!(
        underlying = chain.underlying(),
        spot, lower, upper, tolerance, "searching for zero-gamma level"
    );

    let outcome = try_bisect(
        |x| total_gex_at_spot(chain, x, rate),
        lower,
        upper,
        tolerance,
        config.max_iterations,
    )?;

    match outcome {
        RootOutcome::Converged {
            root,
            iterations,
            residual,
        } => {
            debug!(root, iterations, residual, "zero-gamma level found");
            Ok(ZeroGammaPoint {
                price: root,
                residual,
                iterations,
                lower_bound: lower,
                upper_bound: upper,
            })
        }
        RootOutcome::Unbounded { f_lower, f_upper } => {
            debug!(f_lower, f_upper, "net GEX does not change sign in bracket");
            Err(GexError::UnboundedRoot {
                lower,
                upper,
                f_lower,
                f_upper,
            })
        }
        RootOutcome::Exhausted {
            lower,
            upper,
            iterations,
        } => {
            debug!(lower, upper, iterations, "zero-gamma search hit iteration cap");
            Err(GexError::NonConvergence {
                iterations,
                lower,
                upper,
            })
        }
        RootOutcome::InvalidBracket {
            lower,
            upper,
            tolerance,
        } => Err(GexError::invalid_input(format!(
            "zero-gamma bracket [{lower}, {upper}] with tolerance {tolerance}"
        ))),
    }
}

/// Zero-gamma result as carried in a report
///
/// Solver failures are an expected answer for one-sided chains, so they are
/// kept as data rather than failing the whole analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZeroGammaStatus {
    Found(ZeroGammaPoint),
    NotBracketed {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
    NotConverged {
        iterations: usize,
        lower: f64,
        upper: f64,
    },
}

impl ZeroGammaStatus {
    /// Keep solver failures as a status; any other error is passed through
    pub fn from_result(result: Result<ZeroGammaPoint>) -> Result<Self> {
        match result {
            Ok(point) => Ok(ZeroGammaStatus::Found(point)),
            Err(GexError::UnboundedRoot {
                lower,
                upper,
                f_lower,
                f_upper,
            }) => Ok(ZeroGammaStatus::NotBracketed {
                lower,
                upper,
                f_lower,
                f_upper,
            }),
            Err(GexError::NonConvergence {
                iterations,
                lower,
                upper,
            }) => Ok(ZeroGammaStatus::NotConverged {
                iterations,
                lower,
                upper,
            }),
            Err(e) => Err(e),
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            ZeroGammaStatus::Found(point) => Some(point.price),
            _ => None,
        }
    }
}
