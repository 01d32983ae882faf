//! Core data types for GEX analytics
//!
//! Defines fundamental types:
//! - Contract / Chain: the normalized option chain snapshot
//! - Greeks / ChainGreeks: per-contract and columnar sensitivities
//! - GexConfig: every tunable default in one place
//! - GexError: typed failures

pub mod config;
pub mod error;
pub mod greeks;
pub mod option;

pub use config::*;
pub use error::*;
pub use greeks::*;
pub use option::*;
