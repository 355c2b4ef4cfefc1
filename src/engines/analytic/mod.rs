//! Closed-form Black-Scholes-Merton pricing for European vanilla options.
//!
//! References:
//! - Hull, *Options, Futures, and Other Derivatives*, Ch. 15 and 19.
//! - Merton (1973) for the continuous dividend yield extension.
//!
//! Numerical considerations:
//! - `expiry <= 0` or `vol <= 0` collapses d1/d2, so both cases short-circuit
//!   to the (discounted) intrinsic value instead of dividing by zero.
//! - All Greeks here are raw annualized partials. Market-practice scaling
//!   (per vol point, per day, per 1% rate) lives on the instrument layer.

pub mod bs_batch;

use crate::core::OptionType;
use crate::math::{normal_cdf, normal_pdf};

/// Shared intermediates of the BSM closed forms, computed once per evaluation.
#[derive(Debug, Clone, Copy)]
struct BsTerms {
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    df_r: f64,
    df_q: f64,
    pdf_d1: f64,
}

impl BsTerms {
    /// None when the forms degenerate (expired or deterministic underlying).
    #[inline]
    fn compute(spot: f64, strike: f64, rate: f64, q: f64, vol: f64, expiry: f64) -> Option<Self> {
        if expiry <= 0.0 || vol <= 0.0 || spot <= 0.0 {
            return None;
        }
        let sqrt_t = expiry.sqrt();
        let sig_sqrt_t = vol * sqrt_t;
        let d1 = ((spot / strike).ln() + (rate - q + 0.5 * vol * vol) * expiry) / sig_sqrt_t;
        Some(Self {
            d1,
            d2: d1 - sig_sqrt_t,
            sqrt_t,
            df_r: (-rate * expiry).exp(),
            df_q: (-q * expiry).exp(),
            pdf_d1: normal_pdf(d1),
        })
    }
}

#[inline]
fn degenerate_price(option_type: OptionType, spot: f64, strike: f64, rate: f64, q: f64, expiry: f64) -> f64 {
    if expiry <= 0.0 {
        return option_type.payoff(spot, strike);
    }
    // Zero volatility: forward is deterministic, discount the forward intrinsic.
    let fwd_gap = spot * (-q * expiry).exp() - strike * (-rate * expiry).exp();
    (option_type.sign() * fwd_gap).max(0.0)
}

/// Black-Scholes-Merton price.
#[inline]
pub fn bs_price(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    match BsTerms::compute(spot, strike, rate, dividend_yield, vol, expiry) {
        None => degenerate_price(option_type, spot, strike, rate, dividend_yield, expiry),
        Some(t) => match option_type {
            OptionType::Call => {
                spot * t.df_q * normal_cdf(t.d1) - strike * t.df_r * normal_cdf(t.d2)
            }
            OptionType::Put => {
                strike * t.df_r * normal_cdf(-t.d2) - spot * t.df_q * normal_cdf(-t.d1)
            }
        },
    }
}

/// Spot sensitivity. e^{-qT} N(d1) for calls, e^{-qT}(N(d1) - 1) for puts.
#[inline]
pub fn bs_delta(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    match BsTerms::compute(spot, strike, rate, dividend_yield, vol, expiry) {
        None => 0.0,
        Some(t) => match option_type {
            OptionType::Call => t.df_q * normal_cdf(t.d1),
            OptionType::Put => t.df_q * (normal_cdf(t.d1) - 1.0),
        },
    }
}

/// Second spot sensitivity, identical for calls and puts.
#[inline]
pub fn bs_gamma(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    match BsTerms::compute(spot, strike, rate, dividend_yield, vol, expiry) {
        None => 0.0,
        Some(t) => t.df_q * t.pdf_d1 / (spot * vol * t.sqrt_t),
    }
}

/// Volatility sensitivity per unit of annualized vol, identical for calls and puts.
#[inline]
pub fn bs_vega(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    match BsTerms::compute(spot, strike, rate, dividend_yield, vol, expiry) {
        None => 0.0,
        Some(t) => spot * t.df_q * t.pdf_d1 * t.sqrt_t,
    }
}

/// Calendar decay per year. Negative for long vanilla positions away from
/// deep-ITM put territory.
#[inline]
pub fn bs_theta(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let q = dividend_yield;
    match BsTerms::compute(spot, strike, rate, q, vol, expiry) {
        None => 0.0,
        Some(t) => {
            let decay = -spot * t.df_q * t.pdf_d1 * vol / (2.0 * t.sqrt_t);
            match option_type {
                OptionType::Call => {
                    decay + q * spot * t.df_q * normal_cdf(t.d1)
                        - rate * strike * t.df_r * normal_cdf(t.d2)
                }
                OptionType::Put => {
                    decay - q * spot * t.df_q * normal_cdf(-t.d1)
                        + rate * strike * t.df_r * normal_cdf(-t.d2)
                }
            }
        }
    }
}

/// Rate sensitivity per unit of annualized rate.
#[inline]
pub fn bs_rho(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    match BsTerms::compute(spot, strike, rate, dividend_yield, vol, expiry) {
        None => 0.0,
        Some(t) => match option_type {
            OptionType::Call => strike * expiry * t.df_r * normal_cdf(t.d2),
            OptionType::Put => -strike * expiry * t.df_r * normal_cdf(-t.d2),
        },
    }
}

/// Price plus all five raw Greeks sharing one d1/d2/discount evaluation.
///
/// Returns (price, delta, gamma, vega, theta, rho), all annualized/unscaled.
pub fn bs_price_greeks(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> (f64, f64, f64, f64, f64, f64) {
    let q = dividend_yield;
    let Some(t) = BsTerms::compute(spot, strike, rate, q, vol, expiry) else {
        let price = degenerate_price(option_type, spot, strike, rate, q, expiry);
        return (price, 0.0, 0.0, 0.0, 0.0, 0.0);
    };

    let nd1 = normal_cdf(t.d1);
    let nd2 = normal_cdf(t.d2);
    let nmd1 = 1.0 - nd1;
    let nmd2 = 1.0 - nd2;

    let gamma = t.df_q * t.pdf_d1 / (spot * vol * t.sqrt_t);
    let vega = spot * t.df_q * t.pdf_d1 * t.sqrt_t;
    let decay = -spot * t.df_q * t.pdf_d1 * vol / (2.0 * t.sqrt_t);

    match option_type {
        OptionType::Call => {
            let price = spot * t.df_q * nd1 - strike * t.df_r * nd2;
            let delta = t.df_q * nd1;
            let theta = decay + q * spot * t.df_q * nd1 - rate * strike * t.df_r * nd2;
            let rho = strike * expiry * t.df_r * nd2;
            (price, delta, gamma, vega, theta, rho)
        }
        OptionType::Put => {
            let price = strike * t.df_r * nmd2 - spot * t.df_q * nmd1;
            let delta = t.df_q * (nd1 - 1.0);
            let theta = decay - q * spot * t.df_q * nmd1 + rate * strike * t.df_r * nmd2;
            let rho = -strike * expiry * t.df_r * nmd2;
            (price, delta, gamma, vega, theta, rho)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const S: f64 = 100.0;
    const K: f64 = 100.0;
    const R: f64 = 0.05;
    const SIGMA: f64 = 0.2;
    const T: f64 = 1.0;

    #[test]
    fn hull_reference_prices() {
        let call = bs_price(OptionType::Call, S, K, R, 0.0, SIGMA, T);
        let put = bs_price(OptionType::Put, S, K, R, 0.0, SIGMA, T);
        assert_abs_diff_eq!(call, 10.4506, epsilon = 1e-2);
        assert_abs_diff_eq!(put, 5.5735, epsilon = 1e-2);
    }

    #[test]
    fn moneyness_ladder_prices() {
        assert_abs_diff_eq!(
            bs_price(OptionType::Call, 110.0, K, R, 0.0, SIGMA, T),
            17.663,
            epsilon = 1e-2
        );
        assert_abs_diff_eq!(
            bs_price(OptionType::Call, 90.0, K, R, 0.0, SIGMA, T),
            5.091,
            epsilon = 1e-2
        );
        assert_abs_diff_eq!(
            bs_price(OptionType::Call, S, K, R, 0.0, 0.4, T),
            18.023,
            epsilon = 1e-2
        );
        assert_abs_diff_eq!(
            bs_price(OptionType::Call, S, K, R, 0.0, SIGMA, 0.25),
            4.615,
            epsilon = 1e-2
        );
    }

    #[test]
    fn put_call_parity() {
        for q in [0.0, 0.03] {
            let call = bs_price(OptionType::Call, S, K, R, q, SIGMA, T);
            let put = bs_price(OptionType::Put, S, K, R, q, SIGMA, T);
            let rhs = S * (-q * T).exp() - K * (-R * T).exp();
            assert_abs_diff_eq!(call - put, rhs, epsilon = 1e-2);
        }
    }

    #[test]
    fn atm_deltas() {
        let call = bs_delta(OptionType::Call, S, K, R, 0.0, SIGMA, T);
        let put = bs_delta(OptionType::Put, S, K, R, 0.0, SIGMA, T);
        assert_abs_diff_eq!(call, 0.637, epsilon = 1e-3);
        assert_abs_diff_eq!(put, -0.363, epsilon = 1e-3);
        // Delta parity: call delta - put delta = e^{-qT}, here q = 0.
        assert_relative_eq!(call - put, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn gamma_and_vega_side_independent() {
        let gamma = bs_gamma(S, K, R, 0.0, SIGMA, T);
        let vega = bs_vega(S, K, R, 0.0, SIGMA, T);
        assert!(gamma > 0.0 && vega > 0.0);
        // Both forms only involve d1, so they coincide with the one-pass values.
        let (_, _, g_call, v_call, _, _) = bs_price_greeks(OptionType::Call, S, K, R, 0.0, SIGMA, T);
        let (_, _, g_put, v_put, _, _) = bs_price_greeks(OptionType::Put, S, K, R, 0.0, SIGMA, T);
        assert_relative_eq!(g_call, g_put, epsilon = 1e-12);
        assert_relative_eq!(v_call, v_put, epsilon = 1e-12);
        assert_relative_eq!(g_call, gamma, epsilon = 1e-12);
        assert_relative_eq!(v_call, vega, epsilon = 1e-12);
    }

    #[test]
    fn theta_and_rho_signs() {
        assert!(bs_theta(OptionType::Call, S, K, R, 0.0, SIGMA, T) < 0.0);
        assert!(bs_rho(OptionType::Call, S, K, R, 0.0, SIGMA, T) > 0.0);
        assert!(bs_rho(OptionType::Put, S, K, R, 0.0, SIGMA, T) < 0.0);
    }

    #[test]
    fn one_pass_matches_individual_greeks() {
        for ot in [OptionType::Call, OptionType::Put] {
            let (price, delta, gamma, vega, theta, rho) =
                bs_price_greeks(ot, S, K, R, 0.02, SIGMA, T);
            assert_relative_eq!(price, bs_price(ot, S, K, R, 0.02, SIGMA, T), epsilon = 1e-12);
            assert_relative_eq!(delta, bs_delta(ot, S, K, R, 0.02, SIGMA, T), epsilon = 1e-12);
            assert_relative_eq!(gamma, bs_gamma(S, K, R, 0.02, SIGMA, T), epsilon = 1e-12);
            assert_relative_eq!(vega, bs_vega(S, K, R, 0.02, SIGMA, T), epsilon = 1e-12);
            assert_relative_eq!(theta, bs_theta(ot, S, K, R, 0.02, SIGMA, T), epsilon = 1e-12);
            assert_relative_eq!(rho, bs_rho(ot, S, K, R, 0.02, SIGMA, T), epsilon = 1e-12);
        }
    }

    #[test]
    fn expiry_and_vol_edges_price_to_intrinsic() {
        assert_eq!(bs_price(OptionType::Call, 110.0, K, R, 0.0, SIGMA, 0.0), 10.0);
        assert_eq!(bs_price(OptionType::Put, 110.0, K, R, 0.0, SIGMA, 0.0), 0.0);

        let zero_vol = bs_price(OptionType::Call, S, K, R, 0.0, 0.0, T);
        assert_abs_diff_eq!(zero_vol, S - K * (-R * T).exp(), epsilon = 1e-12);
        assert!(!zero_vol.is_nan());
        assert_eq!(bs_delta(OptionType::Call, S, K, R, 0.0, 0.0, T), 0.0);
    }

    #[test]
    fn delta_finite_difference_consistency() {
        // The bump must be wide enough that the CDF approximation error does
        // not dominate the difference quotient.
        let h = 1e-2;
        for ot in [OptionType::Call, OptionType::Put] {
            let fd = (bs_price(ot, S + h, K, R, 0.0, SIGMA, T)
                - bs_price(ot, S - h, K, R, 0.0, SIGMA, T))
                / (2.0 * h);
            assert_abs_diff_eq!(fd, bs_delta(ot, S, K, R, 0.0, SIGMA, T), epsilon = 1e-4);
        }
    }
}
