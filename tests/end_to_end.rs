//! End-to-end expectations over whole chains

use chrono::{NaiveDate, TimeZone, Utc};
use gex_engine::prelude::*;

fn snapshot() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 20, 0, 0).unwrap()
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

/// Puts below spot, calls above, ~30 days out
fn synthetic_chain() -> Chain {
    let expiry = date(4, 2);
    Chain::new(
        "SYN",
        100.0,
        snapshot(),
        vec![
            Contract::put("SYN", 90.0, expiry).with_open_interest(2000).with_iv(0.2),
            Contract::call("SYN", 110.0, expiry).with_open_interest(2000).with_iv(0.2),
        ],
    )
    .unwrap()
}

#[test]
fn worked_example() {
    let expiry = date(3, 21);
    let chain = Chain::new(
        "SPX",
        100.0,
        snapshot(),
        vec![
            Contract::call("SPX", 100.0, expiry).with_open_interest(1000).with_gamma(0.05),
            Contract::put("SPX", 100.0, expiry).with_open_interest(1000).with_gamma(0.05),
        ],
    )
    .unwrap();

    let gex = calculate_total_gex(&chain, 0.01).unwrap();
    assert!((gex.call_gex - 500_000.0).abs() < 1e-6);
    assert!((gex.put_gex + 500_000.0).abs() < 1e-6);
    assert!(gex.total_gex.abs() < 1e-6);

    let rows = calculate_gex_by_strike(&chain, 0.01).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].net_gex.abs() < 1e-6);
}

#[test]
fn worked_example_from_json() {
    let json = r#"{
        "underlying": "SPX",
        "spot": 100.0,
        "timestamp": "2025-03-03T20:00:00Z",
        "contracts": [
            {"type": "C", "strike": 100.0, "expiration": "2025-03-21",
             "open_interest": 1000, "gamma": 0.05},
            {"type": "P", "strike": 100.0, "expiration": "2025-03-21",
             "open_interest": 1000, "gamma": 0.05}
        ]
    }"#;
    let chain = Chain::from_json(json).unwrap();
    assert_eq!(chain.contracts()[0].underlying, "SPX");
    assert_eq!(chain.contracts()[0].multiplier, 100.0);

    let gex = calculate_total_gex(&chain, 0.01).unwrap();
    assert!((gex.call_gex - 500_000.0).abs() < 1e-6);
    assert!(gex.total_gex.abs() < 1e-6);
}

#[test]
fn zero_gamma_root_on_synthetic_chain() {
    let chain = synthetic_chain();
    let point = find_zero_gamma(&chain, &ZeroGammaConfig::default(), 0.01).unwrap();

    assert!(point.price > 90.0 && point.price < 110.0);

    let f_root = total_gex_at(&chain, point.price);
    let f_lower = total_gex_at(&chain, point.lower_bound);
    let f_upper = total_gex_at(&chain, point.upper_bound);
    assert!(f_lower < 0.0 && f_upper > 0.0);
    assert!(f_root.abs() < 1e-2 * f_lower.abs().min(f_upper.abs()));
    assert!((point.residual - f_root).abs() < 1e-9 * f_lower.abs());
}

fn total_gex_at(chain: &Chain, spot: f64) -> f64 {
    gex_engine::exposure::total_gex_at_spot(chain, spot, 0.01).unwrap()
}

#[test]
fn all_call_chain_has_no_zero_gamma() {
    let expiry = date(4, 2);
    let chain = Chain::new(
        "SYN",
        100.0,
        snapshot(),
        vec![
            Contract::call("SYN", 95.0, expiry).with_open_interest(100).with_iv(0.25),
            Contract::call("SYN", 100.0, expiry).with_open_interest(100).with_iv(0.2),
            Contract::call("SYN", 105.0, expiry).with_open_interest(100).with_iv(0.18),
        ],
    )
    .unwrap();

    match find_zero_gamma(&chain, &ZeroGammaConfig::default(), 0.01) {
        Err(GexError::UnboundedRoot {
            lower,
            upper,
            f_lower,
            f_upper,
        }) => {
            assert_eq!((lower, upper), (80.0, 120.0));
            assert!(f_lower > 0.0 && f_upper > 0.0);
        }
        other => panic!("expected UnboundedRoot, got {other:?}"),
    }
}

#[test]
fn iteration_cap_is_non_convergence() {
    let config = ZeroGammaConfig {
        max_iterations: 3,
        ..ZeroGammaConfig::default()
    };
    let err = find_zero_gamma(&synthetic_chain(), &config, 0.01).unwrap_err();
    assert!(matches!(err, GexError::NonConvergence { iterations: 3, .. }));
}

#[test]
fn time_decay_past_expiry() {
    let chain = Chain::new(
        "SYN",
        100.0,
        snapshot(),
        vec![
            // Expires in 5 days
            Contract::call("SYN", 100.0, date(3, 8)).with_open_interest(1000).with_iv(0.2),
            Contract::put("SYN", 100.0, date(3, 8)).with_open_interest(400).with_iv(0.2),
        ],
    )
    .unwrap();

    let before = scenario_time_decay(&chain, 3, 0.01).unwrap();
    assert!(before.total_gex > 0.0);

    let after = scenario_time_decay(&chain, 5, 0.01).unwrap();
    assert_eq!(after.total_gex, 0.0);
    assert_eq!(after.call_gex, 0.0);
    assert_eq!(after.timestamp, snapshot() + chrono::Duration::days(5));
}

#[test]
fn zero_gamma_chain_weighted_sentinel() {
    let chain = Chain::new(
        "SYN",
        100.0,
        snapshot(),
        vec![
            Contract::call("SYN", 100.0, date(3, 21)).with_open_interest(1000).with_gamma(0.0),
            Contract::put("SYN", 95.0, date(3, 21)).with_open_interest(1000).with_gamma(0.0),
        ],
    )
    .unwrap();

    let weighted = compute_weighted_metrics(&chain, 0.01).unwrap();
    assert!(weighted.weighted_strike.is_nan());
    assert!(weighted.weighted_expiry_days.is_nan());
    assert!(matches!(
        weighted.require_non_empty(),
        Err(GexError::EmptyAggregation(_))
    ));
}

#[test]
fn analyzer_and_scenarios_over_one_chain() {
    let expiry = date(4, 2);
    let mut contracts = Vec::new();
    for strike in (85..=115).step_by(5) {
        let strike = f64::from(strike);
        let oi = 5000 - ((strike - 100.0).abs() as u64) * 200;
        contracts.push(
            Contract::call("SYN", strike, expiry)
                .with_open_interest(if strike >= 100.0 { oi } else { oi / 4 })
                .with_volume(oi / 10)
                .with_iv(0.2),
        );
        contracts.push(
            Contract::put("SYN", strike, expiry)
                .with_open_interest(if strike <= 100.0 { oi } else { oi / 4 })
                .with_volume(oi / 20)
                .with_iv(0.22),
        );
    }
    let chain = Chain::new("SYN", 100.0, snapshot(), contracts).unwrap();

    let report = GexAnalyzer::new().analyze(&chain).unwrap();
    assert!(report.by_strike.len() >= 5);
    assert_eq!(report.dominant_expiry, Some(expiry));
    assert!(report.top_strikes.positive.len() <= 5);
    assert!(!report.flip_points.is_empty());
    let level = report.zero_gamma.price().unwrap();
    assert!(level > 85.0 && level < 115.0);
    assert!(!report.iv_profile.is_empty());

    let scenarios = scenario_all(&chain, &ScenarioConfig::default(), 0.01).unwrap();
    assert_eq!(scenarios.len(), 6);
    assert_eq!(scenarios.base, report.total);

    let flow = analyze_flow(&chain, Some(&chain), &FlowConfig::default()).unwrap();
    let oi = flow.oi_changes.unwrap();
    assert_eq!(oi.changed.len(), chain.len());
    assert_eq!(oi.net_change(), 0);
    assert!((flow.metrics.pct_calls + flow.metrics.pct_puts - 100.0).abs() < 1e-9);
}
