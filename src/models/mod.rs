//! Pricing models
//!
//! Black-Scholes closed-form Greeks drive every gamma that is not supplied
//! by the data source.

pub mod black_scholes;

pub use black_scholes::*;
