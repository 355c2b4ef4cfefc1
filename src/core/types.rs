/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }

    /// Exercise payoff at `spot` against `strike`.
    pub fn payoff(self, spot: f64, strike: f64) -> f64 {
        (self.sign() * (spot - strike)).max(0.0)
    }
}

/// Exercise rights for an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    European,
    /// Exercise at any time up to expiry.
    American,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_matches_side() {
        assert_eq!(OptionType::Call.sign(), 1.0);
        assert_eq!(OptionType::Put.sign(), -1.0);
    }

    #[test]
    fn payoff_is_intrinsic_value() {
        assert_eq!(OptionType::Call.payoff(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.payoff(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.payoff(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.payoff(110.0, 100.0), 0.0);
    }
}
