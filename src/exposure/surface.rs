//! Strike × expiry exposure grid

use chrono::{DateTime, NaiveDate, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::contract_exposures;
use crate::core::{Chain, Result};

/// Net GEX on a dense strike × expiration grid
///
/// Cells with no contract hold 0.0; summing the grid gives the chain's net GEX.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GexSurface {
    /// Distinct strikes, ascending (rows)
    pub strikes: Vec<f64>,
    /// Distinct expirations, ascending (columns)
    pub expirations: Vec<NaiveDate>,
    /// Net GEX grid [strike, expiry]
    pub values: Array2<f64>,
    pub spot_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl GexSurface {
    /// (strikes, expirations)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Net GEX at an exact grid point
    pub fn value_at(&self, strike: f64, expiration: NaiveDate) -> Option<f64> {
        let si = self
            .strikes
            .binary_search_by(|s| s.total_cmp(&strike))
            .ok()?;
        let ei = self.expirations.binary_search(&expiration).ok()?;
        Some(self.values[[si, ei]])
    }

    /// Net GEX per strike across all expirations
    pub fn strike_profile(&self) -> Array1<f64> {
        self.values.sum_axis(ndarray::Axis(1))
    }

    /// Net GEX per expiration across all strikes
    pub fn expiry_profile(&self) -> Array1<f64> {
        self.values.sum_axis(ndarray::Axis(0))
    }

    pub fn total(&self) -> f64 {
        self.values.sum()
    }
}

/// Pivot the chain's per-contract exposure into a [`GexSurface`]
pub fn calculate_gex_surface(chain: &Chain, rate: f64) -> Result<GexSurface> {
    let exposures = contract_exposures(chain, rate)?;
    let strikes = chain.strikes();
    let expirations = chain.expirations();

    let mut values = Array2::zeros((strikes.len(), expirations.len()));
    for (contract, gex) in chain.contracts().iter().zip(&exposures) {
        // Both axes are built from the chain itself, so lookups always hit
        let (Ok(si), Ok(ei)) = (
            strikes.binary_search_by(|s| s.total_cmp(&contract.strike)),
            expirations.binary_search(&contract.expiration),
        ) else {
            continue;
        };
        values[[si, ei]] += gex;
    }

    Ok(GexSurface {
        strikes,
        expirations,
        values,
        spot_price: chain.spot(),
        timestamp: chain.timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Contract;
    use crate::exposure::{calculate_gex_by_expiry, calculate_gex_by_strike, calculate_total_gex};
    use chrono::TimeZone;

    fn chain() -> Chain {
        let near = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        let far = NaiveDate::from_ymd_opt(2025, 2, 21).unwrap();
        Chain::new(
            "SPX",
            100.0,
            Utc.with_ymd_and_hms(2025, 1, 2, 15, 0, 0).unwrap(),
            vec![
                Contract::call("SPX", 95.0, near).with_open_interest(100).with_gamma(0.02),
                Contract::put("SPX", 95.0, near).with_open_interest(400).with_gamma(0.02),
                Contract::call("SPX", 105.0, far).with_open_interest(250).with_iv(0.2),
                Contract::call("SPX", 105.0, far).with_open_interest(50).with_gamma(0.01),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_surface_shape_and_fill() {
        let surface = calculate_gex_surface(&chain(), 0.01).unwrap();
        assert_eq!(surface.dim(), (2, 2));
        assert_eq!(surface.strikes, vec![95.0, 105.0]);

        let far = NaiveDate::from_ymd_opt(2025, 2, 21).unwrap();
        let near = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        // No contract at (95, far) or (105, near)
        assert_eq!(surface.value_at(95.0, far), Some(0.0));
        assert_eq!(surface.value_at(105.0, near), Some(0.0));
        assert!(surface.value_at(95.0, near).unwrap() < 0.0);
        assert!(surface.value_at(100.0, near).is_none());
    }

    #[test]
    fn test_surface_marginals_match_views() {
        let chain = chain();
        let surface = calculate_gex_surface(&chain, 0.01).unwrap();

        let total = calculate_total_gex(&chain, 0.01).unwrap().total_gex;
        assert!((surface.total() - total).abs() < 1e-6);

        let by_strike = calculate_gex_by_strike(&chain, 0.01).unwrap();
        for (row, profile) in by_strike.iter().zip(surface.strike_profile().iter()) {
            assert!((row.net_gex - profile).abs() < 1e-6);
        }

        let by_expiry = calculate_gex_by_expiry(&chain, 0.01).unwrap();
        for (row, profile) in by_expiry.iter().zip(surface.expiry_profile().iter()) {
            assert!((row.net_gex - profile).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_surface() {
        let chain = chain().filter(|_| false);
        let surface = calculate_gex_surface(&chain, 0.01).unwrap();
        assert!(surface.is_empty());
        assert_eq!(surface.total(), 0.0);
    }
}
