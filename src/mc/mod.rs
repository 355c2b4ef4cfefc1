//! Monte Carlo pricing for European vanilla options.
//!
//! Estimators discount the sample mean payoff over simulated terminal prices.
//! The statistical error shrinks as 1/sqrt(num_paths); the antithetic variant
//! halves the number of independent path draws while doubling payoff samples,
//! which lowers variance for monotone payoffs at the same cost.

pub mod lsm;

use crate::core::PricingError;
use crate::instruments::EuropeanOption;
use crate::models::{GeometricBrownianMotion, HestonProcess};

fn check_counts(num_paths: usize, num_steps: usize) -> Result<(), PricingError> {
    if num_paths == 0 {
        return Err(PricingError::InvalidInput(
            "num_paths must be at least 1".to_string(),
        ));
    }
    if num_steps == 0 {
        return Err(PricingError::InvalidInput(
            "num_steps must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Risk-neutral GBM for the option's underlying: drift r - q.
fn risk_neutral_gbm(option: &EuropeanOption, num_steps: usize) -> GeometricBrownianMotion {
    GeometricBrownianMotion::new(
        option.spot,
        option.risk_free_rate - option.dividend_yield,
        option.volatility,
        option.time_to_expiry,
        num_steps,
    )
}

/// Plain Monte Carlo price under risk-neutral GBM.
///
/// Converges in probability to the Black-Scholes price as `num_paths` grows;
/// with 100k paths the relative error is typically well under 1%.
pub fn price_monte_carlo(
    option: &EuropeanOption,
    num_paths: usize,
    num_steps: usize,
    seed: Option<u64>,
) -> Result<f64, PricingError> {
    check_counts(num_paths, num_steps)?;
    if option.time_to_expiry <= 0.0 {
        return Ok(option.option_type.payoff(option.spot, option.strike));
    }

    let terminals = risk_neutral_gbm(option, num_steps).terminal_prices(num_paths, seed);
    let sum: f64 = terminals
        .iter()
        .map(|&s_t| option.option_type.payoff(s_t, option.strike))
        .sum();
    let df = (-option.risk_free_rate * option.time_to_expiry).exp();
    Ok(df * sum / num_paths as f64)
}

/// Antithetic-variate Monte Carlo price.
///
/// `num_paths` counts payoff samples; they come from `num_paths / 2` mirrored
/// draw pairs (rounded up), each pair contributing its averaged payoff.
pub fn price_monte_carlo_antithetic(
    option: &EuropeanOption,
    num_paths: usize,
    num_steps: usize,
    seed: Option<u64>,
) -> Result<f64, PricingError> {
    check_counts(num_paths, num_steps)?;
    if option.time_to_expiry <= 0.0 {
        return Ok(option.option_type.payoff(option.spot, option.strike));
    }

    let n_pairs = num_paths.div_ceil(2);
    let pairs = risk_neutral_gbm(option, num_steps).antithetic_terminal_pairs(n_pairs, seed);
    let sum: f64 = pairs
        .iter()
        .map(|&(s_plus, s_minus)| {
            0.5 * (option.option_type.payoff(s_plus, option.strike)
                + option.option_type.payoff(s_minus, option.strike))
        })
        .sum();
    let df = (-option.risk_free_rate * option.time_to_expiry).exp();
    Ok(df * sum / n_pairs as f64)
}

/// Monte Carlo price with Heston stochastic-volatility terminal prices.
///
/// The variance dynamics replace the option's flat volatility; discounting
/// and the payoff are unchanged.
#[allow(clippy::too_many_arguments)]
pub fn price_heston(
    option: &EuropeanOption,
    initial_variance: f64,
    kappa: f64,
    theta: f64,
    vol_of_vol: f64,
    correlation: f64,
    num_paths: usize,
    num_steps: usize,
    seed: Option<u64>,
) -> Result<f64, PricingError> {
    check_counts(num_paths, num_steps)?;
    if option.time_to_expiry <= 0.0 {
        return Ok(option.option_type.payoff(option.spot, option.strike));
    }

    let process = HestonProcess::new(
        option.spot,
        initial_variance,
        option.risk_free_rate - option.dividend_yield,
        kappa,
        theta,
        vol_of_vol,
        correlation,
        option.time_to_expiry,
        num_steps,
    );
    let (terminals, _variances) = process.terminal_values(num_paths, seed);
    let sum: f64 = terminals
        .iter()
        .map(|&s_t| option.option_type.payoff(s_t, option.strike))
        .sum();
    let df = (-option.risk_free_rate * option.time_to_expiry).exp();
    Ok(df * sum / num_paths as f64)
}

/// Standard error of a discounted mean-payoff estimator:
/// `discount * stddev(payoffs) / sqrt(n)`, with the unbiased sample variance.
pub fn standard_error(payoffs: &[f64], discount: f64) -> f64 {
    let n = payoffs.len();
    if n < 2 {
        return f64::INFINITY;
    }
    let mean = payoffs.iter().sum::<f64>() / n as f64;
    let var = payoffs.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / (n - 1) as f64;
    discount * (var / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionType;
    use approx::assert_relative_eq;

    fn atm_call() -> EuropeanOption {
        EuropeanOption::call(100.0, 100.0, 1.0, 0.05, 0.2).unwrap()
    }

    #[test]
    fn mc_price_close_to_analytic() {
        let option = atm_call();
        let mc = price_monte_carlo(&option, 100_000, 1, Some(42)).unwrap();
        let analytic = option.price();
        let rel_err = (mc - analytic).abs() / analytic;
        assert!(rel_err < 0.02, "mc={mc} analytic={analytic} rel={rel_err}");
    }

    #[test]
    fn mc_put_close_to_analytic() {
        let option = EuropeanOption::put(100.0, 100.0, 1.0, 0.05, 0.2).unwrap();
        let mc = price_monte_carlo(&option, 100_000, 1, Some(17)).unwrap();
        let rel_err = (mc - option.price()).abs() / option.price();
        assert!(rel_err < 0.02, "rel={rel_err}");
    }

    #[test]
    fn antithetic_beats_plain_on_average() {
        let option = atm_call();
        let analytic = option.price();
        let mut plain_err = 0.0;
        let mut anti_err = 0.0;
        for seed in 0..10 {
            let plain = price_monte_carlo(&option, 20_000, 1, Some(seed)).unwrap();
            let anti = price_monte_carlo_antithetic(&option, 20_000, 1, Some(seed)).unwrap();
            plain_err += (plain - analytic).abs();
            anti_err += (anti - analytic).abs();
        }
        assert!(
            anti_err <= plain_err,
            "antithetic mean error {anti_err} vs plain {plain_err}"
        );
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let option = atm_call();
        let a = price_monte_carlo(&option, 50_000, 4, Some(7)).unwrap();
        let b = price_monte_carlo(&option, 50_000, 4, Some(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn heston_with_flat_variance_tracks_black_scholes() {
        // kappa = 0 and xi = 0 freezes the variance at v0: plain GBM with
        // vol = sqrt(v0).
        let option = atm_call();
        let mc = price_heston(&option, 0.04, 0.0, 0.04, 0.0, 0.0, 100_000, 50, Some(11)).unwrap();
        let analytic = option.price();
        assert_relative_eq!(mc, analytic, max_relative = 0.03);
    }

    #[test]
    fn expired_option_prices_to_intrinsic() {
        let option = EuropeanOption::new(OptionType::Call, 110.0, 100.0, 0.0, 0.05, 0.2, 0.0)
            .unwrap();
        assert_eq!(price_monte_carlo(&option, 1_000, 1, Some(1)).unwrap(), 10.0);
    }

    #[test]
    fn zero_paths_is_rejected() {
        let option = atm_call();
        assert!(price_monte_carlo(&option, 0, 1, None).is_err());
        assert!(price_monte_carlo(&option, 100, 0, None).is_err());
    }

    #[test]
    fn standard_error_shrinks_with_sample_size() {
        let payoffs: Vec<f64> = (0..10_000).map(|i| (i % 100) as f64).collect();
        let se_small = standard_error(&payoffs[..100], 1.0);
        let se_large = standard_error(&payoffs, 1.0);
        assert!(se_large < se_small);
        assert!(standard_error(&payoffs[..1], 1.0).is_infinite());
    }
}
