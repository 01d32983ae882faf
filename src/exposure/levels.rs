//! Key levels read off the exposure profile
//!
//! - Top strikes: where the largest positive and negative exposure sits
//! - Flip points: prices between strikes where net exposure changes sign
//! - Dominant expiry: the expiration carrying the most |net GEX|
//! - IV profile: the near-term smile the exposure was priced from

use chrono::NaiveDate;

use super::{ExpiryGex, IvPoint, StrikeGex, TopStrikes};
use crate::core::Chain;

/// The `n` largest positive and `n` most negative per-strike net exposures
///
/// Strikes with exactly zero net exposure appear on neither side. Ties keep
/// ascending strike order.
pub fn top_strikes(by_strike: &[StrikeGex], n: usize) -> TopStrikes {
    let mut positive: Vec<StrikeGex> =
        by_strike.iter().copied().filter(|r| r.net_gex > 0.0).collect();
    positive.sort_by(|a, b| b.net_gex.total_cmp(&a.net_gex));
    positive.truncate(n);

    let mut negative: Vec<StrikeGex> =
        by_strike.iter().copied().filter(|r| r.net_gex < 0.0).collect();
    negative.sort_by(|a, b| a.net_gex.total_cmp(&b.net_gex));
    negative.truncate(n);

    TopStrikes { positive, negative }
}

/// Prices where per-strike net exposure changes sign, ascending
///
/// Between two adjacent nonzero strikes of opposite sign the crossing is linearly
/// interpolated. When zero-exposure strikes separate them, the first such strike
/// is the flip point.
pub fn find_flip_points(by_strike: &[StrikeGex]) -> Vec<f64> {
    let mut flips = Vec::new();
    let mut prev: Option<&StrikeGex> = None;
    let mut zero_between: Option<f64> = None;

    for row in by_strike {
        if row.net_gex == 0.0 {
            zero_between.get_or_insert(row.strike);
            continue;
        }

        if let Some(p) = prev {
            if p.net_gex.signum() != row.net_gex.signum() {
                let flip = zero_between.unwrap_or_else(|| {
                    p.strike + (row.strike - p.strike) * p.net_gex / (p.net_gex - row.net_gex)
                });
                flips.push(flip);
            }
        }

        prev = Some(row);
        zero_between = None;
    }

    flips
}

/// Expiration with the largest |net GEX|; the earliest wins a tie
pub fn dominant_expiry(by_expiry: &[ExpiryGex]) -> Option<NaiveDate> {
    by_expiry
        .iter()
        .fold(None::<&ExpiryGex>, |best, row| match best {
            Some(b) if b.net_gex.abs() >= row.net_gex.abs() => Some(b),
            _ => Some(row),
        })
        .map(|row| row.expiration)
}

/// Implied volatility of unexpired contracts within `max_days` and the strike window
///
/// Ordered by expiration, then strike, calls before puts. Contracts without
/// implied volatility are skipped.
pub fn iv_profile(chain: &Chain, max_days: i64, window_pct: f64) -> Vec<IvPoint> {
    let near = chain
        .within_strike_window(window_pct)
        .filter(|c| (0..=max_days).contains(&chain.days_to_expiry(c)));

    let mut points: Vec<IvPoint> = near
        .contracts()
        .iter()
        .filter_map(|c| {
            c.implied_vol.map(|implied_vol| IvPoint {
                strike: c.strike,
                option_class: c.option_class,
                expiration: c.expiration,
                implied_vol,
            })
        })
        .collect();

    points.sort_by(|a, b| {
        a.expiration
            .cmp(&b.expiration)
            .then(a.strike.total_cmp(&b.strike))
            .then(b.option_class.is_call().cmp(&a.option_class.is_call()))
    });
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Contract, OptionClass};
    use chrono::{TimeZone, Utc};

    fn row(strike: f64, net_gex: f64) -> StrikeGex {
        StrikeGex {
            strike,
            call_gex: net_gex.max(0.0),
            put_gex: net_gex.min(0.0),
            net_gex,
        }
    }

    #[test]
    fn test_top_strikes() {
        let rows = [
            row(90.0, -5.0),
            row(95.0, -1.0),
            row(100.0, 0.0),
            row(105.0, 3.0),
            row(110.0, 7.0),
        ];
        let top = top_strikes(&rows, 1);
        assert_eq!(top.positive.len(), 1);
        assert_eq!(top.positive[0].strike, 110.0);
        assert_eq!(top.negative[0].strike, 90.0);

        let all = top_strikes(&rows, 10);
        assert_eq!(all.positive.len(), 2);
        assert_eq!(all.negative.len(), 2);
    }

    #[test]
    fn test_flip_point_interpolated() {
        // Crosses zero one quarter of the way from 100 to 110
        let rows = [row(90.0, -4.0), row(100.0, -1.0), row(110.0, 3.0)];
        let flips = find_flip_points(&rows);
        assert_eq!(flips.len(), 1);
        assert!((flips[0] - 102.5).abs() < 1e-12);
    }

    #[test]
    fn test_flip_point_at_zero_strike_reported_once() {
        let rows = [row(95.0, -2.0), row(100.0, 0.0), row(105.0, 0.0), row(110.0, 2.0)];
        assert_eq!(find_flip_points(&rows), vec![100.0]);

        // Touching zero without changing sign is not a flip
        let rows = [row(95.0, 2.0), row(100.0, 0.0), row(105.0, 1.0)];
        assert!(find_flip_points(&rows).is_empty());
    }

    #[test]
    fn test_multiple_flips() {
        let rows = [row(90.0, 1.0), row(100.0, -1.0), row(110.0, 1.0)];
        assert_eq!(find_flip_points(&rows), vec![95.0, 105.0]);
        assert!(find_flip_points(&[]).is_empty());
    }

    #[test]
    fn test_dominant_expiry() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let e = |day, net_gex| ExpiryGex {
            expiration: d(day),
            days_to_expiry: 0,
            call_gex: 0.0,
            put_gex: 0.0,
            net_gex,
        };
        assert_eq!(dominant_expiry(&[e(3, 1.0), e(10, -4.0), e(17, 4.0)]), Some(d(10)));
        assert_eq!(dominant_expiry(&[]), None);
    }

    #[test]
    fn test_iv_profile() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let chain = Chain::new(
            "SPY",
            100.0,
            Utc.with_ymd_and_hms(2025, 1, 2, 15, 0, 0).unwrap(),
            vec![
                Contract::put("SPY", 100.0, d(1, 17)).with_iv(0.21),
                Contract::call("SPY", 100.0, d(1, 17)).with_iv(0.20),
                Contract::call("SPY", 95.0, d(1, 17)).with_iv(0.23),
                // no IV, too far out, outside the window, already expired
                Contract::call("SPY", 101.0, d(1, 17)).with_gamma(0.02),
                Contract::call("SPY", 100.0, d(6, 20)).with_iv(0.19),
                Contract::call("SPY", 150.0, d(1, 17)).with_iv(0.40),
                Contract::call("SPY", 100.0, d(1, 1)).with_iv(0.20),
            ],
        )
        .unwrap();

        let points = iv_profile(&chain, 30, 0.15);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].strike, 95.0);
        assert_eq!(points[1].option_class, OptionClass::Call);
        assert_eq!(points[2].option_class, OptionClass::Put);
    }
}
