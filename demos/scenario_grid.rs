//! Example: Scenario grid over a small chain
//!
//! Run with: cargo run --example scenario_grid
//!
//! Shows how net GEX reacts to spot moves, volatility shifts and time decay.

use chrono::{Duration, TimeZone, Utc};
use gex_engine::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let now = Utc
        .with_ymd_and_hms(2025, 3, 3, 20, 0, 0)
        .single()
        .ok_or_else(|| GexError::invalid_input("snapshot time"))?;
    let weekly = now.date_naive() + Duration::days(4);
    let monthly = now.date_naive() + Duration::days(32);

    let chain = Chain::new(
        "QQQ",
        500.0,
        now,
        vec![
            Contract::put("QQQ", 480.0, weekly).with_open_interest(25_000).with_iv(0.24),
            Contract::put("QQQ", 490.0, weekly).with_open_interest(18_000).with_iv(0.22),
            Contract::call("QQQ", 500.0, weekly).with_open_interest(15_000).with_iv(0.19),
            Contract::call("QQQ", 510.0, weekly).with_open_interest(30_000).with_iv(0.18),
            Contract::put("QQQ", 470.0, monthly).with_open_interest(40_000).with_iv(0.25),
            Contract::call("QQQ", 520.0, monthly).with_open_interest(35_000).with_iv(0.19),
        ],
    )?;

    let config = ScenarioConfig {
        spot_shifts: vec![-0.05, -0.02, 0.02, 0.05],
        vol_shifts: vec![-0.05, 0.05, 0.10],
        time_days: vec![1, 4, 7],
        ..ScenarioConfig::default()
    };

    let result = scenario_all(&chain, &config, 0.01)?;

    println!("=== {} scenarios ===\n", chain.underlying());
    println!("Base net GEX: {:+.3e}\n", result.base.total_gex);
    println!("{:<12} {:>10} {:>14} {:>14}", "scenario", "spot", "net GEX", "vs base");
    for (name, entry) in &result.scenarios {
        println!(
            "{:<12} {:>10.2} {:>14.3e} {:>+14.3e}",
            name,
            entry.spot,
            entry.gex.total_gex,
            entry.gex.total_gex - result.base.total_gex
        );
    }

    match find_zero_gamma(&chain, &ZeroGammaConfig::default(), 0.01) {
        Ok(point) => println!("\nZero gamma at {:.2}", point.price),
        Err(e) if e.is_solver_failure() => println!("\nNo zero-gamma level: {e}"),
        Err(e) => return Err(e),
    }

    Ok(())
}
