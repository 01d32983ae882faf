//! Example: Full GEX report for a chain snapshot
//!
//! Run with: cargo run --example gex_report [chain.json]
//!
//! Without an argument a synthetic SPX-like chain is used.
//! Set RUST_LOG=gex_engine=debug to see the pipeline.

use chrono::{Duration, TimeZone, Utc};
use gex_engine::prelude::*;
use tracing_subscriber::EnvFilter;

fn synthetic_chain() -> Result<Chain> {
    let now = Utc
        .with_ymd_and_hms(2025, 3, 3, 20, 0, 0)
        .single()
        .ok_or_else(|| GexError::invalid_input("snapshot time"))?;
    let spot = 5800.0;
    let mut contracts = Vec::new();

    for (days, oi_scale) in [(4, 1.0), (11, 0.8), (18, 0.6), (46, 1.4)] {
        let expiry = now.date_naive() + Duration::days(days);
        for step in -16..=16 {
            let strike = spot + f64::from(step) * 25.0;
            let distance = f64::from(step).abs();
            let base_oi = (4000.0 * (-distance / 8.0).exp() * oi_scale) as u64;
            // Skew: puts carry more vol and more open interest below spot
            let put_iv = 0.16 + 0.004 * (-f64::from(step)).max(0.0);
            let call_iv = 0.14 + 0.001 * distance;

            contracts.push(
                Contract::call("SPX", strike, expiry)
                    .with_open_interest(if step >= 0 { base_oi } else { base_oi / 3 })
                    .with_volume(base_oi / 5)
                    .with_iv(call_iv),
            );
            contracts.push(
                Contract::put("SPX", strike, expiry)
                    .with_open_interest(if step <= 0 { base_oi * 3 / 2 } else { base_oi / 3 })
                    .with_volume(base_oi / 4)
                    .with_iv(put_iv),
            );
        }
    }

    Chain::new("SPX", spot, now, contracts)
}

fn load_chain() -> Result<Chain> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| GexError::invalid_input(format!("{path}: {e}")))?;
            Chain::from_json(&json)
        }
        None => synthetic_chain(),
    }
}

fn billions(x: f64) -> String {
    format!("{:+.3}B", x / 1e9)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let chain = load_chain()?;
    let report = GexAnalyzer::new().analyze(&chain)?;

    println!("=== {} GEX @ {:.2} ===\n", report.underlying, report.spot_price);
    println!("Total:  {}", billions(report.total.total_gex));
    println!("Calls:  {}", billions(report.total.call_gex));
    println!("Puts:   {}", billions(report.total.put_gex));
    println!(
        "Regime: {}",
        if report.total.is_long_gamma() {
            "long gamma (hedging dampens moves)"
        } else {
            "short gamma (hedging amplifies moves)"
        }
    );

    match report.zero_gamma {
        ZeroGammaStatus::Found(point) => println!(
            "\nZero gamma: {:.2} ({} iterations)",
            point.price, point.iterations
        ),
        other => println!("\nZero gamma: not found ({other:?})"),
    }

    println!("\n=== Key Levels ===\n");
    for row in &report.top_strikes.positive {
        println!("  + {:>8.1}  {}", row.strike, billions(row.net_gex));
    }
    for row in &report.top_strikes.negative {
        println!("  - {:>8.1}  {}", row.strike, billions(row.net_gex));
    }
    for flip in &report.flip_points {
        println!("  flip at {flip:.2}");
    }
    if let Some(expiry) = report.dominant_expiry {
        println!("  dominant expiry {expiry}");
    }

    println!("\n=== By Expiry ===\n");
    for row in &report.by_expiry {
        println!(
            "  {} ({:>3}d)  {}",
            row.expiration,
            row.days_to_expiry,
            billions(row.net_gex)
        );
    }

    println!("\n=== By Moneyness ===\n");
    for bucket in &report.moneyness {
        println!(
            "  {:<14} {:>4} contracts  {}",
            bucket.label(),
            bucket.contracts,
            billions(bucket.net_gex)
        );
    }

    if !report.weighted.is_empty() {
        println!(
            "\nGEX-weighted strike {:.1}, expiry {:.1} days",
            report.weighted.weighted_strike, report.weighted.weighted_expiry_days
        );
    }

    let flow = analyze_flow(&chain, None, &GexConfig::default().flow)?;
    println!(
        "\nFlow: {} contracts traded, call/put volume {:.2}, {} unusual strikes, {} large trades",
        flow.metrics.total_volume,
        flow.metrics.call_put_volume_ratio,
        flow.unusual().count(),
        flow.large_trades.len()
    );

    Ok(())
}
