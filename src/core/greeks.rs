//! Option Greeks
//!
//! First and second order sensitivities, per contract and in columnar form
//! for a whole chain.

use serde::{Deserialize, Serialize};

/// Option Greeks (sensitivities) for a single contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS
    pub delta: f64,
    /// Gamma: d²V/dS²
    pub gamma: f64,
    /// Theta: dV/dt, per calendar day
    pub theta: f64,
    /// Vega: dV/dσ, per unit of volatility
    pub vega: f64,
    /// Rho: dV/dr, per unit of rate
    pub rho: f64,
    /// Charm: delta decay, per calendar day
    pub charm: f64,
    /// Vanna: d(delta)/dσ
    pub vanna: f64,
    /// Speed: d(gamma)/dS
    pub speed: f64,
    /// Color: gamma decay, per calendar day
    pub color: f64,
}

impl Greeks {
    /// Scale Greeks by a factor (e.g., position size × multiplier)
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
            rho: self.rho * factor,
            charm: self.charm * factor,
            vanna: self.vanna * factor,
            speed: self.speed * factor,
            color: self.color * factor,
        }
    }

    /// Add two Greeks (for portfolio totals)
    pub fn add(&self, other: &Greeks) -> Self {
        Self {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
            rho: self.rho + other.rho,
            charm: self.charm + other.charm,
            vanna: self.vanna + other.vanna,
            speed: self.speed + other.speed,
            color: self.color + other.color,
        }
    }
}

/// Greeks for every contract of a chain, one column per Greek.
///
/// Row `i` of every column belongs to contract `i` of the source chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainGreeks {
    pub delta: Vec<f64>,
    pub gamma: Vec<f64>,
    pub theta: Vec<f64>,
    pub vega: Vec<f64>,
    pub rho: Vec<f64>,
    pub charm: Vec<f64>,
    pub vanna: Vec<f64>,
    pub speed: Vec<f64>,
    pub color: Vec<f64>,
}

impl ChainGreeks {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            delta: Vec::with_capacity(n),
            gamma: Vec::with_capacity(n),
            theta: Vec::with_capacity(n),
            vega: Vec::with_capacity(n),
            rho: Vec::with_capacity(n),
            charm: Vec::with_capacity(n),
            vanna: Vec::with_capacity(n),
            speed: Vec::with_capacity(n),
            color: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, g: &Greeks) {
        self.delta.push(g.delta);
        self.gamma.push(g.gamma);
        self.theta.push(g.theta);
        self.vega.push(g.vega);
        self.rho.push(g.rho);
        self.charm.push(g.charm);
        self.vanna.push(g.vanna);
        self.speed.push(g.speed);
        self.color.push(g.color);
    }

    pub fn len(&self) -> usize {
        self.gamma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gamma.is_empty()
    }

    /// Reassemble the row for contract `i`
    pub fn get(&self, i: usize) -> Option<Greeks> {
        if i >= self.len() {
            return None;
        }
        Some(Greeks {
            delta: self.delta[i],
            gamma: self.gamma[i],
            theta: self.theta[i],
            vega: self.vega[i],
            rho: self.rho[i],
            charm: self.charm[i],
            vanna: self.vanna[i],
            speed: self.speed[i],
            color: self.color[i],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Greeks {
        Greeks {
            delta: 0.5,
            gamma: 0.02,
            theta: -0.05,
            vega: 0.2,
            rho: 0.1,
            charm: -0.001,
            vanna: 0.03,
            speed: -0.0004,
            color: -0.0002,
        }
    }

    #[test]
    fn test_scale_and_add() {
        let g = sample();
        let doubled = g.scale(2.0);
        assert_eq!(doubled.gamma, 0.04);
        assert_eq!(doubled.color, -0.0004);

        let sum = g.add(&g);
        assert_eq!(sum, doubled);
    }

    #[test]
    fn test_columns_roundtrip_row() {
        let mut cols = ChainGreeks::with_capacity(2);
        cols.push(&sample());
        cols.push(&Greeks::default());

        assert_eq!(cols.len(), 2);
        assert_eq!(cols.get(0), Some(sample()));
        assert_eq!(cols.get(1), Some(Greeks::default()));
        assert_eq!(cols.get(2), None);
    }
}
