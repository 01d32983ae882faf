//! Error types for GEX analytics

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GexError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The initial bracket of the zero-gamma search does not change sign.
    #[error(
        "No zero-gamma point in [{lower:.4}, {upper:.4}]: \
         f(lower)={f_lower:.4e}, f(upper)={f_upper:.4e}"
    )]
    UnboundedRoot {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    /// Bisection hit its iteration cap before the bracket met tolerance.
    #[error(
        "Zero-gamma search did not converge after {iterations} iterations; \
         bracket [{lower:.6}, {upper:.6}]"
    )]
    NonConvergence {
        iterations: usize,
        lower: f64,
        upper: f64,
    },

    #[error("Empty aggregation: {0}")]
    EmptyAggregation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T, E = GexError> = std::result::Result<T, E>;

impl GexError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn empty_aggregation(msg: impl Into<String>) -> Self {
        Self::EmptyAggregation(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// True for the two solver failures, which callers usually treat as "no level"
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, Self::UnboundedRoot { .. } | Self::NonConvergence { .. })
    }
}

impl From<serde_json::Error> for GexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GexError::invalid_input("spot must be positive");
        assert_eq!(err.to_string(), "Invalid input: spot must be positive");

        let err = GexError::NonConvergence {
            iterations: 3,
            lower: 90.0,
            upper: 95.0,
        };
        assert!(err.to_string().contains("3 iterations"));
        assert!(err.is_solver_failure());
        assert!(!GexError::empty_aggregation("no contracts").is_solver_failure());
    }

    #[test]
    fn test_from_json_error() {
        let parse: std::result::Result<f64, _> = serde_json::from_str("not json");
        let err: GexError = parse.unwrap_err().into();
        assert!(matches!(err, GexError::Serialization(_)));
    }
}
