//! Option value types.
//!
//! Instruments are plain immutable values: every `with_*` operation returns a
//! modified copy, and pricing methods borrow the instrument without touching
//! it. Reported Greeks follow desk conventions (vega per vol point, theta per
//! calendar day, rho per 1% rate move); the raw annualized partials are
//! available from [`crate::engines::analytic`] directly.

use crate::core::{OptionType, PricingError};
use crate::engines::analytic::{
    self,
    bs_batch::{self, BsBatchInputs},
};
use crate::engines::numerical::binomial;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Price and the five Greeks of one option evaluation.
///
/// Produced in a single pass so d1/d2 and the discount factors are computed
/// once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionGreeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    /// Per 1 vol point (annualized vega / 100).
    pub vega: f64,
    /// Per calendar day (annual theta / 365).
    pub theta: f64,
    /// Per 1% rate move (annualized rho / 100).
    pub rho: f64,
}

/// Days-per-year convention for reported theta.
const THETA_DAYS: f64 = 365.0;

/// Scale divisor turning annualized vega/rho into per-point values.
const PER_POINT: f64 = 100.0;

fn validate_common(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    volatility: f64,
) -> Result<(), PricingError> {
    if !(spot > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "spot must be positive, got {spot}"
        )));
    }
    if !(strike > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "strike must be positive, got {strike}"
        )));
    }
    if !(time_to_expiry >= 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "time_to_expiry must be non-negative, got {time_to_expiry}"
        )));
    }
    if !(volatility >= 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "volatility must be non-negative, got {volatility}"
        )));
    }
    Ok(())
}

/// European vanilla option priced by the Black-Scholes-Merton closed forms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuropeanOption {
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub dividend_yield: f64,
    pub option_type: OptionType,
}

impl EuropeanOption {
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
        dividend_yield: f64,
    ) -> Result<Self, PricingError> {
        validate_common(spot, strike, time_to_expiry, volatility)?;
        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            dividend_yield,
            option_type,
        })
    }

    pub fn call(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> Result<Self, PricingError> {
        Self::new(
            OptionType::Call,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            0.0,
        )
    }

    pub fn put(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> Result<Self, PricingError> {
        Self::new(
            OptionType::Put,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            0.0,
        )
    }

    pub fn with_spot(&self, spot: f64) -> Self {
        Self { spot, ..*self }
    }

    pub fn with_strike(&self, strike: f64) -> Self {
        Self { strike, ..*self }
    }

    pub fn with_time_to_expiry(&self, time_to_expiry: f64) -> Self {
        Self {
            time_to_expiry,
            ..*self
        }
    }

    pub fn with_rate(&self, risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            ..*self
        }
    }

    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self { volatility, ..*self }
    }

    pub fn with_dividend_yield(&self, dividend_yield: f64) -> Self {
        Self {
            dividend_yield,
            ..*self
        }
    }

    pub fn price(&self) -> f64 {
        analytic::bs_price(
            self.option_type,
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        )
    }

    pub fn delta(&self) -> f64 {
        analytic::bs_delta(
            self.option_type,
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        )
    }

    pub fn gamma(&self) -> f64 {
        analytic::bs_gamma(
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        )
    }

    /// Vega per 1 vol point.
    pub fn vega(&self) -> f64 {
        analytic::bs_vega(
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        ) / PER_POINT
    }

    /// Theta per calendar day.
    pub fn theta(&self) -> f64 {
        analytic::bs_theta(
            self.option_type,
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        ) / THETA_DAYS
    }

    /// Rho per 1% rate move.
    pub fn rho(&self) -> f64 {
        analytic::bs_rho(
            self.option_type,
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        ) / PER_POINT
    }

    /// Price and all five Greeks in one pass.
    pub fn greeks(&self) -> OptionGreeks {
        let (price, delta, gamma, vega, theta, rho) = analytic::bs_price_greeks(
            self.option_type,
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
        );
        OptionGreeks {
            price,
            delta,
            gamma,
            vega: vega / PER_POINT,
            theta: theta / THETA_DAYS,
            rho: rho / PER_POINT,
        }
    }

    /// Batch pricing over parallel parameter arrays. Output order matches
    /// input order; any length mismatch fails before pricing.
    pub fn price_many(
        option_type: OptionType,
        spots: &[f64],
        strikes: &[f64],
        times: &[f64],
        rates: &[f64],
        vols: &[f64],
        dividend_yields: &[f64],
    ) -> Result<Vec<f64>, PricingError> {
        bs_batch::price_many(
            option_type,
            BsBatchInputs {
                spots,
                strikes,
                expiries: times,
                rates,
                vols,
                dividend_yields,
            },
        )
    }

    /// Batch Greeks over parallel parameter arrays, reported with the same
    /// scaling as [`EuropeanOption::greeks`]. Returns six parallel vectors:
    /// price, delta, gamma, vega, theta, rho.
    #[allow(clippy::type_complexity)]
    pub fn greeks_many(
        option_type: OptionType,
        spots: &[f64],
        strikes: &[f64],
        times: &[f64],
        rates: &[f64],
        vols: &[f64],
        dividend_yields: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>), PricingError> {
        let (price, delta, gamma, mut vega, mut theta, mut rho) = bs_batch::greeks_many(
            option_type,
            BsBatchInputs {
                spots,
                strikes,
                expiries: times,
                rates,
                vols,
                dividend_yields,
            },
        )?;
        for v in &mut vega {
            *v /= PER_POINT;
        }
        for t in &mut theta {
            *t /= THETA_DAYS;
        }
        for r in &mut rho {
            *r /= PER_POINT;
        }
        Ok((price, delta, gamma, vega, theta, rho))
    }

    /// Monte Carlo price under risk-neutral GBM; unseeded, so repeated calls
    /// differ by sampling noise. See [`crate::mc::price_monte_carlo`] for the
    /// seedable variant.
    pub fn price_monte_carlo(
        &self,
        num_paths: usize,
        num_steps: usize,
    ) -> Result<f64, PricingError> {
        crate::mc::price_monte_carlo(self, num_paths, num_steps, None)
    }

    /// Antithetic-variate Monte Carlo price.
    pub fn price_monte_carlo_antithetic(
        &self,
        num_paths: usize,
        num_steps: usize,
    ) -> Result<f64, PricingError> {
        crate::mc::price_monte_carlo_antithetic(self, num_paths, num_steps, None)
    }

    /// Monte Carlo price with Heston stochastic-volatility dynamics in place
    /// of the flat volatility.
    #[allow(clippy::too_many_arguments)]
    pub fn price_heston(
        &self,
        initial_variance: f64,
        kappa: f64,
        theta: f64,
        vol_of_vol: f64,
        correlation: f64,
        num_paths: usize,
        num_steps: usize,
    ) -> Result<f64, PricingError> {
        crate::mc::price_heston(
            self,
            initial_variance,
            kappa,
            theta,
            vol_of_vol,
            correlation,
            num_paths,
            num_steps,
            None,
        )
    }
}

/// American vanilla option priced on a CRR binomial tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmericanOption {
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub dividend_yield: f64,
    pub option_type: OptionType,
    /// Binomial tree resolution.
    pub steps: usize,
}

/// Default tree resolution, a reasonable accuracy/latency trade for vanilla
/// American options.
pub const DEFAULT_BINOMIAL_STEPS: usize = 100;

impl AmericanOption {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
        dividend_yield: f64,
        steps: usize,
    ) -> Result<Self, PricingError> {
        validate_common(spot, strike, time_to_expiry, volatility)?;
        if steps == 0 {
            return Err(PricingError::InvalidInput(
                "steps must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            dividend_yield,
            option_type,
            steps,
        })
    }

    pub fn call(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> Result<Self, PricingError> {
        Self::new(
            OptionType::Call,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            0.0,
            DEFAULT_BINOMIAL_STEPS,
        )
    }

    pub fn put(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> Result<Self, PricingError> {
        Self::new(
            OptionType::Put,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            0.0,
            DEFAULT_BINOMIAL_STEPS,
        )
    }

    pub fn with_spot(&self, spot: f64) -> Self {
        Self { spot, ..*self }
    }

    pub fn with_strike(&self, strike: f64) -> Self {
        Self { strike, ..*self }
    }

    pub fn with_time_to_expiry(&self, time_to_expiry: f64) -> Self {
        Self {
            time_to_expiry,
            ..*self
        }
    }

    pub fn with_rate(&self, risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            ..*self
        }
    }

    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self { volatility, ..*self }
    }

    pub fn with_dividend_yield(&self, dividend_yield: f64) -> Self {
        Self {
            dividend_yield,
            ..*self
        }
    }

    pub fn with_steps(&self, steps: usize) -> Self {
        Self { steps, ..*self }
    }

    pub fn price(&self) -> Result<f64, PricingError> {
        binomial::crr_binomial_price(
            self.option_type,
            self.spot,
            self.strike,
            self.risk_free_rate,
            self.dividend_yield,
            self.volatility,
            self.time_to_expiry,
            self.steps,
        )
    }

    /// Central finite difference with a 1% relative spot bump.
    pub fn delta(&self) -> Result<f64, PricingError> {
        let h = self.spot * 0.01;
        let up = self.with_spot(self.spot + h).price()?;
        let down = self.with_spot(self.spot - h).price()?;
        Ok((up - down) / (2.0 * h))
    }

    /// Second central difference with a 1% relative spot bump.
    pub fn gamma(&self) -> Result<f64, PricingError> {
        let h = self.spot * 0.01;
        let up = self.with_spot(self.spot + h).price()?;
        let mid = self.price()?;
        let down = self.with_spot(self.spot - h).price()?;
        Ok((up - 2.0 * mid + down) / (h * h))
    }

    /// Per 1 vol point, central difference with a 1-point vol bump.
    pub fn vega(&self) -> Result<f64, PricingError> {
        let h = 0.01;
        let up = self.with_volatility(self.volatility + h).price()?;
        let down = self.with_volatility((self.volatility - h).max(0.0)).price()?;
        Ok((up - down) / (2.0 * PER_POINT))
    }

    /// Per calendar day, one-day time decay. Zero inside the final day.
    pub fn theta(&self) -> Result<f64, PricingError> {
        let day = 1.0 / THETA_DAYS;
        if self.time_to_expiry <= day {
            return Ok(0.0);
        }
        let now = self.price()?;
        let later = self
            .with_time_to_expiry(self.time_to_expiry - day)
            .price()?;
        Ok(later - now)
    }

    /// Per 1% rate move, central difference with a 1-point rate bump.
    pub fn rho(&self) -> Result<f64, PricingError> {
        let h = 0.01;
        let up = self.with_rate(self.risk_free_rate + h).price()?;
        let down = self.with_rate(self.risk_free_rate - h).price()?;
        Ok((up - down) / (2.0 * PER_POINT))
    }

    /// Price and all five finite-difference Greeks, reusing the base price
    /// for gamma and theta.
    pub fn greeks(&self) -> Result<OptionGreeks, PricingError> {
        let price = self.price()?;

        let hs = self.spot * 0.01;
        let spot_up = self.with_spot(self.spot + hs).price()?;
        let spot_down = self.with_spot(self.spot - hs).price()?;

        let vol_up = self.with_volatility(self.volatility + 0.01).price()?;
        let vol_down = self
            .with_volatility((self.volatility - 0.01).max(0.0))
            .price()?;

        let rate_up = self.with_rate(self.risk_free_rate + 0.01).price()?;
        let rate_down = self.with_rate(self.risk_free_rate - 0.01).price()?;

        let day = 1.0 / THETA_DAYS;
        let theta = if self.time_to_expiry <= day {
            0.0
        } else {
            self.with_time_to_expiry(self.time_to_expiry - day)
                .price()?
                - price
        };

        Ok(OptionGreeks {
            price,
            delta: (spot_up - spot_down) / (2.0 * hs),
            gamma: (spot_up - 2.0 * price + spot_down) / (hs * hs),
            vega: (vol_up - vol_down) / (2.0 * PER_POINT),
            theta,
            rho: (rate_up - rate_down) / (2.0 * PER_POINT),
        })
    }

    /// Batch pricing across independent trees, one per element.
    #[allow(clippy::too_many_arguments)]
    pub fn price_many(
        option_type: OptionType,
        spots: &[f64],
        strikes: &[f64],
        times: &[f64],
        rates: &[f64],
        vols: &[f64],
        dividend_yields: &[f64],
        steps: usize,
    ) -> Result<Vec<f64>, PricingError> {
        binomial::price_many(
            option_type,
            spots,
            strikes,
            times,
            rates,
            vols,
            dividend_yields,
            steps,
        )
    }

    /// Batch finite-difference Greeks, parallelized across instruments.
    /// Returns six parallel vectors: price, delta, gamma, vega, theta, rho.
    #[allow(clippy::too_many_arguments, clippy::type_complexity)]
    pub fn greeks_many(
        option_type: OptionType,
        spots: &[f64],
        strikes: &[f64],
        times: &[f64],
        rates: &[f64],
        vols: &[f64],
        dividend_yields: &[f64],
        steps: usize,
    ) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>), PricingError> {
        let n = spots.len();
        for (name, len) in [
            ("strikes", strikes.len()),
            ("times", times.len()),
            ("rates", rates.len()),
            ("vols", vols.len()),
            ("dividend_yields", dividend_yields.len()),
        ] {
            if len != n {
                return Err(PricingError::length_mismatch(name, n, len));
            }
        }

        let one = |i: usize| -> Result<OptionGreeks, PricingError> {
            AmericanOption::new(
                option_type,
                spots[i],
                strikes[i],
                times[i],
                rates[i],
                vols[i],
                dividend_yields[i],
                steps,
            )?
            .greeks()
        };

        #[cfg(feature = "parallel")]
        let per_element: Result<Vec<OptionGreeks>, PricingError> =
            (0..n).into_par_iter().map(one).collect();
        #[cfg(not(feature = "parallel"))]
        let per_element: Result<Vec<OptionGreeks>, PricingError> = (0..n).map(one).collect();

        let per_element = per_element?;
        let mut out = (
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
        );
        for g in per_element {
            out.0.push(g.price);
            out.1.push(g.delta);
            out.2.push(g.gamma);
            out.3.push(g.vega);
            out.4.push(g.theta);
            out.5.push(g.rho);
        }
        Ok(out)
    }
}
