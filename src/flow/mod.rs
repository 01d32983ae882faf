//! Option flow analytics
//!
//! Works on raw chain data only (volume, open interest, strike, multiplier);
//! nothing here needs gamma.
//!
//! - **OI changes**: day-over-day open interest per contract
//! - **Volume vs OI**: unusual activity by strike and class
//! - **Large trades**: contracts with big traded notional
//! - **Metrics**: call/put split and per-contract volume share

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Chain, Contract, ContractKey, FlowConfig, OptionClass, Result};

/// Open interest of one contract on two consecutive snapshots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OiChange {
    pub key: ContractKey,
    pub today_oi: u64,
    pub yesterday_oi: u64,
    /// today − yesterday
    pub change: i64,
    /// change / yesterday × 100, dividing by 1 when yesterday is 0
    pub change_pct: f64,
}

impl OiChange {
    fn new(key: ContractKey, today_oi: u64, yesterday_oi: u64) -> Self {
        let change = today_oi as i64 - yesterday_oi as i64;
        Self {
            key,
            today_oi,
            yesterday_oi,
            change,
            change_pct: change as f64 / yesterday_oi.max(1) as f64 * 100.0,
        }
    }
}

/// Day-over-day OI split by contract lifecycle, each list ordered by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OiComparison {
    /// Only in today's chain
    pub new: Vec<OiChange>,
    /// Only in yesterday's chain
    pub closed: Vec<OiChange>,
    /// In both
    pub changed: Vec<OiChange>,
}

impl OiComparison {
    /// Net OI added across all contracts
    pub fn net_change(&self) -> i64 {
        self.new
            .iter()
            .chain(&self.closed)
            .chain(&self.changed)
            .map(|c| c.change)
            .sum()
    }
}

fn oi_by_key(chain: &Chain) -> BTreeMap<ContractKey, u64> {
    let mut oi = BTreeMap::new();
    for c in chain.contracts() {
        *oi.entry(c.key()).or_insert(0) += c.open_interest;
    }
    oi
}

/// Join two snapshots on (strike, expiration, class) and classify each contract
///
/// Rows sharing a key within one snapshot are summed first.
pub fn compare_oi_changes(today: &Chain, yesterday: &Chain) -> OiComparison {
    let today_oi = oi_by_key(today);
    let mut yesterday_oi = oi_by_key(yesterday);
    let mut result = OiComparison::default();

    for (key, oi) in today_oi {
        match yesterday_oi.remove(&key) {
            Some(prev) => result.changed.push(OiChange::new(key, oi, prev)),
            None => result.new.push(OiChange::new(key, oi, 0)),
        }
    }
    result.closed = yesterday_oi
        .into_iter()
        .map(|(key, prev)| OiChange::new(key, 0, prev))
        .collect();

    debug!(
        new = result.new.len(),
        closed = result.closed.len(),
        changed = result.changed.len(),
        "compared open interest"
    );
    result
}

/// Volume against open interest at one (strike, class)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeOiRow {
    pub strike: f64,
    pub option_class: OptionClass,
    pub volume: u64,
    pub open_interest: u64,
    /// Mean over contracts of volume / max(OI, 1)
    pub mean_volume_to_oi: f64,
    /// Some contract traded more than threshold × its OI
    pub unusual: bool,
}

fn volume_to_oi(c: &Contract) -> f64 {
    c.volume as f64 / c.open_interest.max(1) as f64
}

/// Volume/OI per (strike, class), ascending by strike with calls first
pub fn analyze_volume_vs_oi(chain: &Chain, threshold: f64) -> Vec<VolumeOiRow> {
    let mut order: Vec<&Contract> = chain.contracts().iter().collect();
    order.sort_by(|a, b| {
        a.strike
            .total_cmp(&b.strike)
            .then(b.option_class.is_call().cmp(&a.option_class.is_call()))
    });

    let mut rows: Vec<VolumeOiRow> = Vec::new();
    let mut members = 0usize;
    for c in order {
        let ratio = volume_to_oi(c);
        let unusual = ratio > threshold;

        match rows.last_mut() {
            Some(row) if row.strike == c.strike && row.option_class == c.option_class => {
                members += 1;
                row.volume += c.volume;
                row.open_interest += c.open_interest;
                // running mean
                row.mean_volume_to_oi += (ratio - row.mean_volume_to_oi) / members as f64;
                row.unusual |= unusual;
            }
            _ => {
                members = 1;
                rows.push(VolumeOiRow {
                    strike: c.strike,
                    option_class: c.option_class,
                    volume: c.volume,
                    open_interest: c.open_interest,
                    mean_volume_to_oi: ratio,
                    unusual,
                });
            }
        }
    }
    rows
}

/// Contract with large traded notional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeTrade {
    pub contract: Contract,
    /// volume × strike × multiplier
    pub notional: f64,
}

/// Contracts with `volume ≥ min_volume` and notional ≥ `min_notional`,
/// largest notional first (ties keep chain order)
pub fn track_large_trades(chain: &Chain, min_volume: u64, min_notional: f64) -> Vec<LargeTrade> {
    let mut trades: Vec<LargeTrade> = chain
        .contracts()
        .iter()
        .filter(|c| c.volume >= min_volume)
        .map(|c| LargeTrade {
            notional: c.notional(),
            contract: c.clone(),
        })
        .filter(|t| t.notional >= min_notional)
        .collect();
    trades.sort_by(|a, b| b.notional.total_cmp(&a.notional));
    trades
}

/// Chain-wide volume and OI summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMetrics {
    pub total_volume: u64,
    pub total_oi: u64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub call_oi: u64,
    pub put_oi: u64,
    /// NaN when total OI is 0
    pub volume_to_oi_ratio: f64,
    /// NaN when put volume is 0
    pub call_put_volume_ratio: f64,
    /// 0 when nothing traded
    pub pct_calls: f64,
    pub pct_puts: f64,
    /// Each contract's share of total volume, chain order; NaN when nothing traded
    pub volume_share: Vec<f64>,
}

fn ratio_or_nan(num: u64, den: u64) -> f64 {
    if den == 0 {
        f64::NAN
    } else {
        num as f64 / den as f64
    }
}

pub fn aggregate_flow_metrics(chain: &Chain) -> FlowMetrics {
    let (mut call_volume, mut put_volume, mut call_oi, mut put_oi) = (0u64, 0u64, 0u64, 0u64);
    for c in chain.contracts() {
        match c.option_class {
            OptionClass::Call => {
                call_volume += c.volume;
                call_oi += c.open_interest;
            }
            OptionClass::Put => {
                put_volume += c.volume;
                put_oi += c.open_interest;
            }
        }
    }

    let total_volume = call_volume + put_volume;
    let total_oi = call_oi + put_oi;
    let (pct_calls, pct_puts) = if total_volume > 0 {
        (
            call_volume as f64 / total_volume as f64 * 100.0,
            put_volume as f64 / total_volume as f64 * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    FlowMetrics {
        total_volume,
        total_oi,
        call_volume,
        put_volume,
        call_oi,
        put_oi,
        volume_to_oi_ratio: ratio_or_nan(total_volume, total_oi),
        call_put_volume_ratio: ratio_or_nan(call_volume, put_volume),
        pct_calls,
        pct_puts,
        volume_share: chain
            .contracts()
            .iter()
            .map(|c| ratio_or_nan(c.volume, total_volume))
            .collect(),
    }
}

/// All flow views for one snapshot, thresholds from [`FlowConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowReport {
    pub metrics: FlowMetrics,
    pub volume_vs_oi: Vec<VolumeOiRow>,
    pub large_trades: Vec<LargeTrade>,
    /// Present when a previous snapshot was supplied
    pub oi_changes: Option<OiComparison>,
}

impl FlowReport {
    pub fn unusual(&self) -> impl Iterator<Item = &VolumeOiRow> {
        self.volume_vs_oi.iter().filter(|r| r.unusual)
    }
}

pub fn analyze_flow(
    today: &Chain,
    yesterday: Option<&Chain>,
    config: &FlowConfig,
) -> Result<FlowReport> {
    config.validate()?;
    Ok(FlowReport {
        metrics: aggregate_flow_metrics(today),
        volume_vs_oi: analyze_volume_vs_oi(today, config.unusual_volume_threshold),
        large_trades: track_large_trades(today, config.min_volume, config.min_notional),
        oi_changes: yesterday.map(|prev| compare_oi_changes(today, prev)),
    })
}
