//! Error taxonomy shared across pricing engines and curve machinery.
//!
//! Everything here is a programming or input error: the engine performs no
//! I/O, so there are no retryable failures. Batch entry points validate the
//! whole call before producing any output.

/// Engine and model errors surfaced by the pricing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Input validation error.
    InvalidInput(String),
    /// Numerical issue (probability outside [0, 1], invalid state, etc.).
    NumericalError(String),
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NumericalError(msg) => write!(f, "numerical error: {msg}"),
        }
    }
}

impl std::error::Error for PricingError {}

impl PricingError {
    /// Length-mismatch error for batch entry points, naming both lengths.
    pub fn length_mismatch(what: &str, expected: usize, got: usize) -> Self {
        Self::InvalidInput(format!(
            "all input arrays must have the same length: {what} has length {got}, expected {expected}"
        ))
    }
}

/// Errors raised by the zero-coupon curve and forward-curve views.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveError {
    /// The curve holds no knots.
    Empty,
    /// A discount factor or rate was requested at a negative maturity.
    NegativeMaturity(f64),
    /// Interpolation method name not recognized at construction.
    UnknownInterpolation(String),
    /// Forward interval with t2 <= t1 or negative start.
    InvalidForwardInterval { t1: f64, t2: f64 },
    /// Anything else rejected at validation time.
    InvalidInput(String),
}

impl std::fmt::Display for CurveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "curve has no knots"),
            Self::NegativeMaturity(t) => {
                write!(f, "maturity must be non-negative, got {t}")
            }
            Self::UnknownInterpolation(name) => write!(
                f,
                "unknown interpolation method '{name}' (expected linear, log_linear, or cubic)"
            ),
            Self::InvalidForwardInterval { t1, t2 } => {
                write!(f, "forward interval requires 0 <= t1 < t2, got t1={t1}, t2={t2}")
            }
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for CurveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_names_both_lengths() {
        let err = PricingError::length_mismatch("strikes", 4, 3);
        let msg = err.to_string();
        assert!(msg.contains("same length"), "{msg}");
        assert!(msg.contains('3') && msg.contains('4'), "{msg}");
    }

    #[test]
    fn curve_errors_display() {
        assert!(CurveError::Empty.to_string().contains("no knots"));
        assert!(
            CurveError::UnknownInterpolation("quartic".into())
                .to_string()
                .contains("quartic")
        );
    }
}
