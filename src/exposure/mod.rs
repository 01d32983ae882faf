//! Gamma Exposure Aggregation
//!
//! Turns per-contract gamma and open interest into dollar gamma exposure:
//!
//! `gex = ±gamma × open_interest × multiplier × spot² × 0.01`
//!
//! i.e. the dollar change in dealer delta for a 1% move in the underlying.
//! Calls count positive (dealers modelled long gamma), puts negative
//! (dealers modelled short gamma). Every view below uses that sign.
//!
//! Views:
//! - **Total**: call / put / net ([`GexResult`])
//! - **By strike / by expiry**: ordered rows
//! - **Surface**: dense strike × expiry grid ([`GexSurface`])
//! - **Moneyness / cumulative / weighted**: distribution summaries
//! - **Levels**: top strikes, flip points, dominant expiry
//!
//! The aggregation functions never filter; [`GexAnalyzer`] applies the
//! configured strike window and expiry horizon before calling them.

mod aggregator;
mod analyzer;
mod levels;
mod surface;

pub use aggregator::*;
pub use analyzer::*;
pub use levels::*;
pub use surface::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::OptionClass;

/// Scale of the exposure: per 1% move in spot
pub const GEX_PER_PCT: f64 = 0.01;

/// Aggregate gamma exposure of a chain at one spot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GexResult {
    /// Net exposure: call_gex + put_gex
    pub total_gex: f64,
    /// Call exposure (≥ 0)
    pub call_gex: f64,
    /// Put exposure, already signed (≤ 0)
    pub put_gex: f64,
    /// Spot the exposure was evaluated at
    pub spot_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl GexResult {
    pub fn new(call_gex: f64, put_gex: f64, spot_price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            total_gex: call_gex + put_gex,
            call_gex,
            put_gex,
            spot_price,
            timestamp,
        }
    }

    /// Net exposure is positive: dealer hedging dampens moves
    pub fn is_long_gamma(&self) -> bool {
        self.total_gex > 0.0
    }

    /// |put| / call; NaN without call exposure
    pub fn put_call_ratio(&self) -> f64 {
        if self.call_gex == 0.0 {
            f64::NAN
        } else {
            self.put_gex.abs() / self.call_gex
        }
    }
}

/// Exposure at one strike, all expirations combined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeGex {
    pub strike: f64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
}

/// Exposure at one expiration, all strikes combined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpiryGex {
    pub expiration: NaiveDate,
    pub days_to_expiry: i64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
}

/// Exposure of contracts whose moneyness falls in (lower, upper]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneynessBucket {
    pub lower: f64,
    pub upper: f64,
    pub net_gex: f64,
    /// Contracts that landed in the bucket (0 for an empty bucket)
    pub contracts: usize,
}

impl MoneynessBucket {
    /// Label like "(0.90, 1.00]"
    pub fn label(&self) -> String {
        format!("({:.2}, {:.2}]", self.lower, self.upper)
    }
}

/// One row of the cumulative profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativeGex {
    pub strike: f64,
    /// Net exposure at this strike
    pub net_gex: f64,
    /// Running sum up to and including this strike
    pub cumulative_gex: f64,
}

/// |GEX|-weighted location of exposure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedMetrics {
    /// NaN when there is no exposure to weight by
    pub weighted_strike: f64,
    /// NaN when there is no exposure to weight by
    pub weighted_expiry_days: f64,
    pub total_abs_gex: f64,
}

/// Strikes carrying the largest exposure on each side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopStrikes {
    /// Largest positive net exposure first
    pub positive: Vec<StrikeGex>,
    /// Most negative net exposure first
    pub negative: Vec<StrikeGex>,
}

/// Implied volatility sample for the near-term smile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvPoint {
    pub strike: f64,
    pub option_class: OptionClass,
    pub expiration: NaiveDate,
    pub implied_vol: f64,
}

/// Neumaier-compensated sum, so large opposite call/put legs cancel cleanly
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StableSum {
    sum: f64,
    compensation: f64,
}

impl StableSum {
    pub(crate) fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    pub(crate) fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl FromIterator<f64> for StableSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = StableSum::default();
        for x in iter {
            acc.add(x);
        }
        acc
    }
}
