//! Cox-Ross-Rubinstein binomial pricing with early exercise.
//!
//! References:
//! - Cox, Ross & Rubinstein (1979).
//! - Hull, *Options, Futures, and Other Derivatives*, Ch. 13.
//!
//! Numerical considerations:
//! - Node prices use the multiplicative identity
//!   `S * u^j * d^(i-j) = S * d^i * (u/d)^j`, so the whole tree needs no
//!   `powf` in the inner loops.
//! - The CRR price oscillates around the continuous limit as `steps` grows;
//!   doubling steps damps the oscillation. 100 steps is enough for vanilla
//!   quotes to cent accuracy, risk systems typically use 200-500.

use crate::core::{OptionType, PricingError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum batch size before trees are spread across the thread pool.
const PARALLEL_CUTOFF: usize = 100;

/// Prices an American option on a CRR tree.
///
/// `steps` trades accuracy for time; the tree costs O(steps^2). With
/// `dividend_yield = 0` the call price matches the European closed form to
/// within discretization error, since early exercise of a non-dividend call
/// is never optimal.
#[allow(clippy::too_many_arguments)]
pub fn crr_binomial_price(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
    steps: usize,
) -> Result<f64, PricingError> {
    if steps == 0 {
        return Err(PricingError::InvalidInput(
            "binomial steps must be > 0".to_string(),
        ));
    }
    if expiry <= 0.0 || vol <= 0.0 {
        return Ok(option_type.payoff(spot, strike));
    }

    let dt = expiry / steps as f64;
    let u = (vol * dt.sqrt()).exp();
    let d = 1.0 / u;
    let p = (((rate - dividend_yield) * dt).exp() - d) / (u - d);
    if !(0.0..=1.0).contains(&p) {
        return Err(PricingError::NumericalError(format!(
            "risk-neutral probability {p} outside [0, 1]; reduce dt or check rate/vol"
        )));
    }
    let disc = (-rate * dt).exp();

    let mut values = vec![0.0_f64; steps + 1];
    Ok(rollback(
        &mut values,
        steps,
        spot,
        strike,
        option_type,
        u,
        d,
        p,
        disc,
    ))
}

#[allow(clippy::too_many_arguments)]
fn rollback(
    values: &mut [f64],
    steps: usize,
    spot0: f64,
    strike: f64,
    option_type: OptionType,
    u: f64,
    d: f64,
    p: f64,
    disc: f64,
) -> f64 {
    debug_assert!(values.len() > steps);

    let ratio = u / d;
    let one_minus_p = 1.0 - p;

    // Terminal layer: lowest node is spot0 * d^steps, each neighbor is a
    // ratio multiple up.
    let mut st = spot0 * d.powi(steps as i32);
    for value in values.iter_mut().take(steps + 1) {
        *value = option_type.payoff(st, strike);
        st *= ratio;
    }

    // Backward induction, keeping the lowest node price of each layer in
    // `base` (d^(i-1) = d^i * u).
    let mut base = spot0 * d.powi(steps as i32 - 1);
    for i in (0..steps).rev() {
        let mut st = base;
        for j in 0..=i {
            let continuation = disc * (p * values[j + 1] + one_minus_p * values[j]);
            let exercise = option_type.payoff(st, strike);
            values[j] = continuation.max(exercise);
            st *= ratio;
        }
        base *= u;
    }

    values[0]
}

/// Prices a batch of American options, one independent tree per element.
///
/// All parameter slices must share a length; `steps` is common to the batch.
/// Parallelized across instruments for large batches, output order matching
/// input order.
#[allow(clippy::too_many_arguments)]
pub fn price_many(
    option_type: OptionType,
    spots: &[f64],
    strikes: &[f64],
    expiries: &[f64],
    rates: &[f64],
    vols: &[f64],
    dividend_yields: &[f64],
    steps: usize,
) -> Result<Vec<f64>, PricingError> {
    let n = spots.len();
    for (name, len) in [
        ("strikes", strikes.len()),
        ("expiries", expiries.len()),
        ("rates", rates.len()),
        ("vols", vols.len()),
        ("dividend_yields", dividend_yields.len()),
    ] {
        if len != n {
            return Err(PricingError::length_mismatch(name, n, len));
        }
    }

    let one = |i: usize| {
        crr_binomial_price(
            option_type,
            spots[i],
            strikes[i],
            rates[i],
            dividend_yields[i],
            vols[i],
            expiries[i],
            steps,
        )
    };

    #[cfg(feature = "parallel")]
    if n > PARALLEL_CUTOFF {
        return (0..n).into_par_iter().map(one).collect();
    }

    (0..n).map(one).collect()
}
