//! Option contracts and chain snapshots
//!
//! A [`Chain`] is the normalized table handed over by whatever fetched the data:
//! one underlying, one spot, one observation time, many contracts.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::{GexError, Result};

/// Days per year used for time to expiry, theta and time decay
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Standard equity option multiplier
pub const DEFAULT_MULTIPLIER: f64 = 100.0;

/// Option class (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionClass {
    #[serde(alias = "C", alias = "CALL", alias = "Call")]
    Call,
    #[serde(alias = "P", alias = "PUT", alias = "Put")]
    Put,
}

impl OptionClass {
    /// Dealer sign convention: +1 for calls, -1 for puts
    pub fn gex_sign(&self) -> f64 {
        match self {
            OptionClass::Call => 1.0,
            OptionClass::Put => -1.0,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, OptionClass::Call)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionClass::Call => "C",
            OptionClass::Put => "P",
        }
    }
}

/// Contract identity: (strike, expiration, option class)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContractKey {
    pub strike: f64,
    pub expiration: NaiveDate,
    pub option_class: OptionClass,
}

impl ContractKey {
    pub fn new(strike: f64, expiration: NaiveDate, option_class: OptionClass) -> Self {
        Self {
            strike,
            expiration,
            option_class,
        }
    }

    // Strikes are validated finite and positive, so bit equality is value equality.
    fn strike_bits(&self) -> u64 {
        self.strike.to_bits()
    }
}

impl PartialEq for ContractKey {
    fn eq(&self, other: &Self) -> bool {
        self.strike_bits() == other.strike_bits()
            && self.expiration == other.expiration
            && self.option_class == other.option_class
    }
}

impl Eq for ContractKey {}

impl Hash for ContractKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.strike_bits().hash(state);
        self.expiration.hash(state);
        self.option_class.hash(state);
    }
}

impl PartialOrd for ContractKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContractKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.strike
            .total_cmp(&other.strike)
            .then(self.expiration.cmp(&other.expiration))
            .then(self.option_class.cmp(&other.option_class))
    }
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

/// One option line of a chain snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Underlying symbol; filled from the chain when omitted in JSON
    #[serde(default)]
    pub underlying: String,
    #[serde(alias = "type")]
    pub option_class: OptionClass,
    pub strike: f64,
    pub expiration: NaiveDate,
    #[serde(default)]
    pub open_interest: u64,
    #[serde(default)]
    pub volume: u64,
    /// Implied volatility as a decimal (0.20 = 20%)
    #[serde(default, alias = "iv")]
    pub implied_vol: Option<f64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Gamma supplied by the data source; derived from `implied_vol` when absent
    #[serde(default)]
    pub gamma: Option<f64>,
}

impl Contract {
    pub fn new(
        underlying: impl Into<String>,
        option_class: OptionClass,
        strike: f64,
        expiration: NaiveDate,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            option_class,
            strike,
            expiration,
            open_interest: 0,
            volume: 0,
            implied_vol: None,
            multiplier: DEFAULT_MULTIPLIER,
            gamma: None,
        }
    }

    pub fn call(underlying: impl Into<String>, strike: f64, expiration: NaiveDate) -> Self {
        Self::new(underlying, OptionClass::Call, strike, expiration)
    }

    pub fn put(underlying: impl Into<String>, strike: f64, expiration: NaiveDate) -> Self {
        Self::new(underlying, OptionClass::Put, strike, expiration)
    }

    pub fn with_open_interest(mut self, open_interest: u64) -> Self {
        self.open_interest = open_interest;
        self
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_iv(mut self, implied_vol: f64) -> Self {
        self.implied_vol = Some(implied_vol);
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn key(&self) -> ContractKey {
        ContractKey::new(self.strike, self.expiration, self.option_class)
    }

    /// Strike over spot
    pub fn moneyness(&self, spot: f64) -> f64 {
        self.strike / spot
    }

    /// Traded notional: volume × strike × multiplier
    pub fn notional(&self) -> f64 {
        self.volume as f64 * self.strike * self.multiplier
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(GexError::invalid_input(format!(
                "contract #{index}: strike must be positive, got {}",
                self.strike
            )));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(GexError::invalid_input(format!(
                "contract #{index}: multiplier must be positive, got {}",
                self.multiplier
            )));
        }
        if let Some(iv) = self.implied_vol {
            if !iv.is_finite() {
                return Err(GexError::invalid_input(format!(
                    "contract #{index}: implied volatility is not finite"
                )));
            }
        }
        if let Some(gamma) = self.gamma {
            if !gamma.is_finite() {
                return Err(GexError::invalid_input(format!(
                    "contract #{index}: gamma is not finite"
                )));
            }
        }
        Ok(())
    }
}

/// Wire shape of a chain before validation
#[derive(Debug, Clone, Deserialize)]
struct ChainRecord {
    underlying: String,
    spot: f64,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    contracts: Vec<Contract>,
}

impl TryFrom<ChainRecord> for Chain {
    type Error = GexError;

    fn try_from(record: ChainRecord) -> Result<Self> {
        let contracts = record
            .contracts
            .into_iter()
            .map(|mut c| {
                if c.underlying.is_empty() {
                    c.underlying = record.underlying.clone();
                }
                c
            })
            .collect();
        Chain::new(record.underlying, record.spot, record.timestamp, contracts)
    }
}

/// Snapshot of an option chain at one observation time
///
/// Invariants, checked on construction:
/// - every contract has the chain's underlying
/// - spot is a single positive scalar for the whole chain
/// - strikes and multipliers are positive and finite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChainRecord")]
pub struct Chain {
    underlying: String,
    spot: f64,
    timestamp: DateTime<Utc>,
    contracts: Vec<Contract>,
}

impl Chain {
    pub fn new(
        underlying: impl Into<String>,
        spot: f64,
        timestamp: DateTime<Utc>,
        contracts: Vec<Contract>,
    ) -> Result<Self> {
        let underlying = underlying.into();
        if !(spot.is_finite() && spot > 0.0) {
            return Err(GexError::invalid_input(format!(
                "spot must be positive, got {spot}"
            )));
        }
        for (i, contract) in contracts.iter().enumerate() {
            if contract.underlying != underlying {
                return Err(GexError::invalid_input(format!(
                    "contract #{i}: underlying {} does not match chain underlying {}",
                    contract.underlying, underlying
                )));
            }
            contract.validate(i)?;
        }

        Ok(Self {
            underlying,
            spot,
            timestamp,
            contracts,
        })
    }

    /// Parse and validate a chain from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// UTC calendar date of the snapshot
    pub fn snapshot_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Calendar days from snapshot to expiration (negative once expired)
    pub fn days_to_expiry(&self, contract: &Contract) -> i64 {
        (contract.expiration - self.snapshot_date()).num_days()
    }

    /// Time to expiry in years (days / 365)
    pub fn time_to_expiry(&self, contract: &Contract) -> f64 {
        self.days_to_expiry(contract) as f64 / DAYS_PER_YEAR
    }

    /// Error out on an empty chain for operations that need contracts
    pub fn require_non_empty(&self, operation: &str) -> Result<()> {
        if self.contracts.is_empty() {
            return Err(GexError::invalid_input(format!(
                "{operation}: chain for {} has no contracts",
                self.underlying
            )));
        }
        Ok(())
    }

    /// Distinct strikes, ascending
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self.contracts.iter().map(|c| c.strike).collect();
        strikes.sort_by(|a, b| a.total_cmp(b));
        strikes.dedup();
        strikes
    }

    /// Distinct expirations, ascending
    pub fn expirations(&self) -> Vec<NaiveDate> {
        let mut expiries: Vec<NaiveDate> = self.contracts.iter().map(|c| c.expiration).collect();
        expiries.sort();
        expiries.dedup();
        expiries
    }

    /// Sub-chain with the same snapshot, keeping contracts matching `keep`
    pub fn filter(&self, keep: impl Fn(&Contract) -> bool) -> Self {
        Self {
            underlying: self.underlying.clone(),
            spot: self.spot,
            timestamp: self.timestamp,
            contracts: self.contracts.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }

    /// Keep strikes within [spot × (1 − pct), spot × (1 + pct)]
    pub fn within_strike_window(&self, pct: f64) -> Self {
        let (lower, upper) = price_bounds(self.spot, pct);
        self.filter(|c| c.strike >= lower && c.strike <= upper)
    }

    /// Keep expirations at most `max_days` after the snapshot date
    pub fn within_days(&self, max_days: i64) -> Self {
        self.filter(|c| self.days_to_expiry(c) <= max_days)
    }

    /// Same contracts observed at a different spot
    pub fn with_spot(&self, spot: f64) -> Result<Self> {
        Chain::new(
            self.underlying.clone(),
            spot,
            self.timestamp,
            self.contracts.clone(),
        )
    }
}

/// Symmetric price window around spot
pub fn price_bounds(spot: f64, pct: f64) -> (f64, f64) {
    (spot * (1.0 - pct), spot * (1.0 + pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 21).unwrap()
    }

    fn snapshot() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 22, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_option_class() {
        assert_eq!(OptionClass::Call.gex_sign(), 1.0);
        assert_eq!(OptionClass::Put.gex_sign(), -1.0);
        assert!(OptionClass::Call.is_call());
        assert_eq!(OptionClass::Put.label(), "P");
    }

    #[test]
    fn test_time_to_expiry() {
        let contracts = vec![Contract::call("SPY", 500.0, expiry())];
        let chain = Chain::new("SPY", 500.0, snapshot(), contracts).unwrap();
        let contract = &chain.contracts()[0];

        assert_eq!(chain.days_to_expiry(contract), 30);
        assert!((chain.time_to_expiry(contract) - 30.0 / 365.0).abs() < 1e-12);
    }

    #[test]
    fn test_chain_validation() {
        assert!(Chain::new("SPY", 0.0, snapshot(), vec![]).is_err());
        assert!(Chain::new("SPY", f64::NAN, snapshot(), vec![]).is_err());

        let bad_strike = vec![Contract::call("SPY", -5.0, expiry())];
        assert!(Chain::new("SPY", 100.0, snapshot(), bad_strike).is_err());

        let wrong_underlying = vec![Contract::call("QQQ", 100.0, expiry())];
        let err = Chain::new("SPY", 100.0, snapshot(), wrong_underlying).unwrap_err();
        assert!(matches!(err, GexError::InvalidInput(_)));

        let bad_multiplier = vec![Contract::put("SPY", 100.0, expiry()).with_multiplier(0.0)];
        assert!(Chain::new("SPY", 100.0, snapshot(), bad_multiplier).is_err());

        // Empty chains are legal to hold
        let empty = Chain::new("SPY", 100.0, snapshot(), vec![]).unwrap();
        assert!(empty.is_empty());
        assert!(empty.require_non_empty("total gex").is_err());
    }

    #[test]
    fn test_contract_key_identity() {
        let a = Contract::call("SPY", 100.0, expiry()).with_open_interest(10);
        let b = Contract::call("SPY", 100.0, expiry()).with_open_interest(99);
        let c = Contract::put("SPY", 100.0, expiry());

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert!(a.key() < c.key());

        let mut set = std::collections::HashSet::new();
        set.insert(a.key());
        assert!(set.contains(&b.key()));
    }

    #[test]
    fn test_filters() {
        let contracts = vec![
            Contract::call("SPY", 80.0, expiry()),
            Contract::call("SPY", 100.0, expiry()),
            Contract::put("SPY", 115.0, expiry()),
            Contract::put("SPY", 120.0, NaiveDate::from_ymd_opt(2026, 6, 19).unwrap()),
        ];
        let chain = Chain::new("SPY", 100.0, snapshot(), contracts).unwrap();

        let windowed = chain.within_strike_window(0.15);
        assert_eq!(windowed.strikes(), vec![100.0, 115.0]);

        let near = chain.within_days(365);
        assert_eq!(near.len(), 3);
        assert_eq!(chain.expirations().len(), 2);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "underlying": "SPX",
            "spot": 5000.0,
            "timestamp": "2025-01-22T15:30:00Z",
            "contracts": [
                {"type": "C", "strike": 5000.0, "expiration": "2025-02-21",
                 "open_interest": 1200, "volume": 300, "iv": 0.18},
                {"option_class": "put", "strike": 4900.0, "expiration": "2025-02-21",
                 "open_interest": 800, "gamma": 0.0012}
            ]
        }"#;

        let chain = Chain::from_json(json).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.contracts()[0].underlying, "SPX");
        assert_eq!(chain.contracts()[0].option_class, OptionClass::Call);
        assert_eq!(chain.contracts()[0].implied_vol, Some(0.18));
        assert_eq!(chain.contracts()[1].multiplier, DEFAULT_MULTIPLIER);
        assert_eq!(chain.contracts()[1].gamma, Some(0.0012));

        let bad = json.replace("\"spot\": 5000.0", "\"spot\": -1.0");
        assert!(Chain::from_json(&bad).is_err());
    }
}
