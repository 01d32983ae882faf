//! Root finding
//!
//! [`bisect`] is a plain bracketing solver that reports *how* it ended instead
//! of failing; [`find_zero_gamma`] runs it on the net GEX profile and turns a
//! missing bracket or an exhausted budget into typed errors.

mod zero_gamma;

pub use zero_gamma::*;

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a bisection ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RootOutcome {
    /// Bracket narrowed below tolerance (or a midpoint hit zero exactly)
    Converged {
        root: f64,
        iterations: usize,
        /// f(root)
        residual: f64,
    },
    /// Endpoints do not straddle zero
    Unbounded { f_lower: f64, f_upper: f64 },
    /// Iteration cap reached; the last bracket still holds the sign change
    Exhausted {
        lower: f64,
        upper: f64,
        iterations: usize,
    },
    /// Bracket or tolerance unusable; `f` was never evaluated
    InvalidBracket {
        lower: f64,
        upper: f64,
        tolerance: f64,
    },
}

impl RootOutcome {
    pub fn root(&self) -> Option<f64> {
        match self {
            RootOutcome::Converged { root, .. } => Some(*root),
            _ => None,
        }
    }
}

/// Bisect `f` on `[lower, upper]` until the bracket is narrower than `tolerance`
///
/// - Non-finite bounds, `lower >= upper`, or a tolerance that is not finite and positive:
///   `InvalidBracket`
/// - Same sign at both ends, both ends exactly zero, or a non-finite endpoint value: `Unbounded`
/// - Exactly one end at zero: that end is the root
/// - Otherwise the root is the midpoint of the final bracket
pub fn bisect<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_iterations: usize,
) -> RootOutcome
where
    F: FnMut(f64) -> f64,
{
    let objective = |x| Ok::<f64, Infallible>(f(x));
    match try_bisect(objective, lower, upper, tolerance, max_iterations) {
        Ok(outcome) => outcome,
        Err(never) => match never {},
    }
}

/// [`bisect`] for an objective that can fail; the first error stops the search
pub fn try_bisect<F, E>(
    mut f: F,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<RootOutcome, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let bracket_ok = lower.is_finite() && upper.is_finite() && lower < upper;
    if !bracket_ok || !(tolerance.is_finite() && tolerance > 0.0) {
        return Ok(RootOutcome::InvalidBracket {
            lower,
            upper,
            tolerance,
        });
    }

    let mut f_low = f(lower)?;
    let f_high = f(upper)?;

    if !(f_low.is_finite() && f_high.is_finite()) || (f_low == 0.0 && f_high == 0.0) {
        return Ok(RootOutcome::Unbounded {
            f_lower: f_low,
            f_upper: f_high,
        });
    }
    if f_low == 0.0 {
        return Ok(RootOutcome::Converged {
            root: lower,
            iterations: 0,
            residual: 0.0,
        });
    }
    if f_high == 0.0 {
        return Ok(RootOutcome::Converged {
            root: upper,
            iterations: 0,
            residual: 0.0,
        });
    }
    if f_low.signum() == f_high.signum() {
        return Ok(RootOutcome::Unbounded {
            f_lower: f_low,
            f_upper: f_high,
        });
    }

    let mut low = lower;
    let mut high = upper;
    let mut iterations = 0;

    while high - low >= tolerance {
        if iterations == max_iterations {
            return Ok(RootOutcome::Exhausted {
                lower: low,
                upper: high,
                iterations,
            });
        }
        iterations += 1;

        let mid = 0.5 * (low + high);
        let f_mid = f(mid)?;
        trace!(iteration = iterations, low, high, mid, f_mid, "bisection step");

        if f_mid == 0.0 {
            return Ok(RootOutcome::Converged {
                root: mid,
                iterations,
                residual: 0.0,
            });
        }

        if f_mid.signum() == f_low.signum() {
            low = mid;
            f_low = f_mid;
        } else {
            high = mid;
        }
    }

    let root = 0.5 * (low + high);
    Ok(RootOutcome::Converged {
        root,
        iterations,
        residual: f(root)?,
    })
}
