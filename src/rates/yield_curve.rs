//! Zero-coupon yield curve bootstrapped from bond prices.
//!
//! The curve accepts a mix of zero-coupon and coupon-bearing bonds.
//! Zero-coupon bonds pin discount factors directly; coupon bonds are solved
//! in maturity order, valuing interior coupons off the knots already known.
//! Queries interpolate with the configured [`InterpolationMethod`] inside the
//! knot range and extrapolate at a flat zero rate outside it.

use std::str::FromStr;

use crate::core::CurveError;
use crate::math::CubicSpline;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Batch queries above this many points run on the rayon pool.
const PARALLEL_CUTOFF: usize = 100;

/// A bond used as a curve input, zero-coupon or coupon-bearing.
#[derive(Debug, Clone, PartialEq)]
pub struct Security {
    /// Time to maturity in years.
    pub maturity: f64,
    /// Market price.
    pub price: f64,
    /// Face value repaid at maturity.
    pub face_value: f64,
    /// Annual coupon rate as a decimal (0.05 for 5%).
    pub coupon_rate: f64,
    /// Coupon payments per year. 0 means zero-coupon.
    pub frequency: usize,
}

impl Security {
    /// Zero-coupon bond with a face value of 100.
    pub fn zero_coupon(maturity: f64, price: f64) -> Self {
        Self {
            maturity,
            price,
            face_value: 100.0,
            coupon_rate: 0.0,
            frequency: 0,
        }
    }

    /// Coupon-bearing bond.
    pub fn coupon_bond(
        maturity: f64,
        price: f64,
        face_value: f64,
        coupon_rate: f64,
        frequency: usize,
    ) -> Self {
        Self {
            maturity,
            price,
            face_value,
            coupon_rate,
            frequency,
        }
    }

    /// True when the bond pays no coupons.
    pub fn is_zero_coupon(&self) -> bool {
        self.coupon_rate == 0.0 || self.frequency == 0
    }
}

/// Interpolation method applied between curve knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMethod {
    /// Linear interpolation of discount factors.
    Linear,
    /// Linear interpolation of ln(DF), giving piecewise constant forward
    /// rates. The industry default.
    #[default]
    LogLinear,
    /// Natural cubic spline through the discount factors.
    Cubic,
}

impl FromStr for InterpolationMethod {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "log_linear" | "loglinear" => Ok(Self::LogLinear),
            "cubic" | "cubic_spline" => Ok(Self::Cubic),
            other => Err(CurveError::UnknownInterpolation(other.to_string())),
        }
    }
}

/// Zero-coupon yield curve with cached knots for O(log n) queries.
#[derive(Debug, Clone)]
pub struct ZeroCouponCurve {
    securities: Vec<Security>,
    maturities: Vec<f64>,
    discount_factors: Vec<f64>,
    zero_rates: Vec<f64>,
    method: InterpolationMethod,
    // Rebuilt after every bootstrap; present only for Cubic with >= 2 knots.
    spline: Option<CubicSpline>,
}

impl ZeroCouponCurve {
    /// Builds and bootstraps a curve from bond securities.
    pub fn new(
        securities: Vec<Security>,
        method: InterpolationMethod,
    ) -> Result<Self, CurveError> {
        let mut curve = Self {
            securities,
            maturities: Vec::new(),
            discount_factors: Vec::new(),
            zero_rates: Vec::new(),
            method,
            spline: None,
        };
        curve.bootstrap()?;
        Ok(curve)
    }

    /// Builds a curve of zero-coupon bonds from parallel vectors.
    ///
    /// `face_values` defaults to 100 for every bond when omitted.
    pub fn from_vectors(
        maturities: Vec<f64>,
        prices: Vec<f64>,
        face_values: Option<Vec<f64>>,
        method: InterpolationMethod,
    ) -> Result<Self, CurveError> {
        if maturities.len() != prices.len() {
            return Err(CurveError::InvalidInput(format!(
                "maturities and prices must have the same length, got {} and {}",
                maturities.len(),
                prices.len()
            )));
        }
        let face_values = match face_values {
            Some(fv) => {
                if fv.len() != maturities.len() {
                    return Err(CurveError::InvalidInput(format!(
                        "face_values must have the same length as maturities, got {} and {}",
                        fv.len(),
                        maturities.len()
                    )));
                }
                fv
            }
            None => vec![100.0; maturities.len()],
        };

        let securities = maturities
            .iter()
            .zip(prices.iter())
            .zip(face_values.iter())
            .map(|((&maturity, &price), &face_value)| Security {
                maturity,
                price,
                face_value,
                coupon_rate: 0.0,
                frequency: 0,
            })
            .collect();
        Self::new(securities, method)
    }

    /// Adds a security and re-bootstraps the whole curve.
    pub fn add_security(&mut self, security: Security) -> Result<(), CurveError> {
        self.securities.push(security);
        if let Err(err) = self.bootstrap() {
            self.securities.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Discount factor at `maturity`.
    ///
    /// Exactly 1.0 at zero. Interpolates inside the knot range and
    /// extrapolates at a flat zero rate beyond either end.
    pub fn discount_factor(&self, maturity: f64) -> Result<f64, CurveError> {
        if maturity < 0.0 {
            return Err(CurveError::NegativeMaturity(maturity));
        }
        if maturity == 0.0 {
            return Ok(1.0);
        }
        if self.maturities.is_empty() {
            return Err(CurveError::Empty);
        }

        match self
            .maturities
            .binary_search_by(|knot| knot.total_cmp(&maturity))
        {
            Ok(idx) => Ok(self.discount_factors[idx]),
            Err(0) => Ok(flat_extrapolate(
                self.maturities[0],
                self.discount_factors[0],
                maturity,
            )),
            Err(idx) if idx >= self.maturities.len() => {
                let last = self.maturities.len() - 1;
                Ok(flat_extrapolate(
                    self.maturities[last],
                    self.discount_factors[last],
                    maturity,
                ))
            }
            Err(idx) => Ok(self.interpolate(maturity, idx)),
        }
    }

    /// Continuously compounded zero rate, `-ln(DF(t)) / t`. Zero at `t = 0`.
    pub fn zero_rate(&self, maturity: f64) -> Result<f64, CurveError> {
        if maturity == 0.0 {
            return Ok(0.0);
        }
        let df = self.discount_factor(maturity)?;
        Ok(-df.ln() / maturity)
    }

    /// Present value of a single cash flow.
    pub fn present_value(&self, cash_flow: f64, maturity: f64) -> Result<f64, CurveError> {
        Ok(cash_flow * self.discount_factor(maturity)?)
    }

    /// Total present value of a set of cash flows.
    pub fn present_value_many(
        &self,
        cash_flows: &[f64],
        maturities: &[f64],
    ) -> Result<f64, CurveError> {
        if cash_flows.len() != maturities.len() {
            return Err(CurveError::InvalidInput(format!(
                "cash_flows and maturities must have the same length, got {} and {}",
                cash_flows.len(),
                maturities.len()
            )));
        }

        #[cfg(feature = "parallel")]
        if cash_flows.len() > PARALLEL_CUTOFF {
            return cash_flows
                .par_iter()
                .zip(maturities.par_iter())
                .map(|(&cf, &t)| self.discount_factor(t).map(|df| cf * df))
                .try_reduce(|| 0.0, |a, b| Ok(a + b));
        }

        let mut pv = 0.0;
        for (&cf, &t) in cash_flows.iter().zip(maturities.iter()) {
            pv += cf * self.discount_factor(t)?;
        }
        Ok(pv)
    }

    /// Discount factors for a batch of maturities, order preserved.
    pub fn discount_factors_many(&self, maturities: &[f64]) -> Result<Vec<f64>, CurveError> {
        #[cfg(feature = "parallel")]
        if maturities.len() > PARALLEL_CUTOFF {
            return maturities
                .par_iter()
                .map(|&t| self.discount_factor(t))
                .collect();
        }
        maturities.iter().map(|&t| self.discount_factor(t)).collect()
    }

    /// Zero rates for a batch of maturities, order preserved.
    pub fn zero_rates_many(&self, maturities: &[f64]) -> Result<Vec<f64>, CurveError> {
        #[cfg(feature = "parallel")]
        if maturities.len() > PARALLEL_CUTOFF {
            return maturities.par_iter().map(|&t| self.zero_rate(t)).collect();
        }
        maturities.iter().map(|&t| self.zero_rate(t)).collect()
    }

    /// Number of securities backing the curve.
    pub fn size(&self) -> usize {
        self.securities.len()
    }

    /// Knot maturities in ascending order.
    pub fn maturities(&self) -> &[f64] {
        &self.maturities
    }

    /// Bootstrapped discount factors, aligned with [`maturities`](Self::maturities).
    pub fn discount_factors(&self) -> &[f64] {
        &self.discount_factors
    }

    /// Bootstrapped zero rates, aligned with [`maturities`](Self::maturities).
    pub fn zero_rates(&self) -> &[f64] {
        &self.zero_rates
    }

    /// Interpolation method the curve was built with.
    pub fn interpolation_method(&self) -> InterpolationMethod {
        self.method
    }

    /// Recomputes all knots from the security set.
    fn bootstrap(&mut self) -> Result<(), CurveError> {
        for sec in &self.securities {
            if !(sec.maturity > 0.0) || !(sec.price > 0.0) || !(sec.face_value > 0.0) {
                return Err(CurveError::InvalidInput(format!(
                    "security requires positive maturity, price, and face value, \
                     got maturity={}, price={}, face_value={}",
                    sec.maturity, sec.price, sec.face_value
                )));
            }
        }

        self.securities
            .sort_by(|a, b| a.maturity.total_cmp(&b.maturity));
        if self
            .securities
            .windows(2)
            .any(|w| w[0].maturity == w[1].maturity)
        {
            return Err(CurveError::InvalidInput(
                "duplicate maturities in security set".to_string(),
            ));
        }

        self.maturities.clear();
        self.discount_factors.clear();
        self.zero_rates.clear();
        self.spline = None;

        for i in 0..self.securities.len() {
            let sec = self.securities[i].clone();
            let df = if sec.is_zero_coupon() {
                sec.price / sec.face_value
            } else {
                self.bootstrap_coupon_bond(&sec)?
            };
            if !(df > 0.0) {
                return Err(CurveError::InvalidInput(format!(
                    "bootstrapped discount factor {df} at maturity {} is not positive",
                    sec.maturity
                )));
            }
            self.maturities.push(sec.maturity);
            self.discount_factors.push(df);
            self.zero_rates.push(-df.ln() / sec.maturity);
        }

        if self.method == InterpolationMethod::Cubic && self.maturities.len() >= 2 {
            self.spline = Some(
                CubicSpline::natural(self.maturities.clone(), self.discount_factors.clone())
                    .map_err(|e| CurveError::InvalidInput(e.to_string()))?,
            );
        }
        Ok(())
    }

    /// Solves one coupon bond against the knots bootstrapped so far.
    ///
    /// Interior coupons at `i / frequency` are valued off the partial curve,
    /// then `DF(T) = (price - pv_coupons) / (coupon + face)`.
    fn bootstrap_coupon_bond(&self, sec: &Security) -> Result<f64, CurveError> {
        let freq = sec.frequency as f64;
        let coupon = sec.coupon_rate * sec.face_value / freq;
        let periods = (sec.maturity * freq).round() as usize;

        let mut pv_coupons = 0.0;
        for i in 1..periods {
            let t = i as f64 / freq;
            pv_coupons += coupon * self.partial_discount_factor(t)?;
        }
        Ok((sec.price - pv_coupons) / (coupon + sec.face_value))
    }

    /// Discount factor off the knots accumulated mid-bootstrap.
    fn partial_discount_factor(&self, t: f64) -> Result<f64, CurveError> {
        match self.maturities.binary_search_by(|knot| knot.total_cmp(&t)) {
            Ok(idx) => Ok(self.discount_factors[idx]),
            Err(0) => {
                if self.maturities.is_empty() {
                    return Err(CurveError::InvalidInput(format!(
                        "coupon date {t} precedes every bootstrapped knot"
                    )));
                }
                Ok(flat_extrapolate(
                    self.maturities[0],
                    self.discount_factors[0],
                    t,
                ))
            }
            Err(idx) if idx >= self.maturities.len() => {
                let last = self.maturities.len() - 1;
                Ok(flat_extrapolate(
                    self.maturities[last],
                    self.discount_factors[last],
                    t,
                ))
            }
            Err(idx) => match self.method {
                InterpolationMethod::Linear => Ok(linear_interpolate(
                    t,
                    self.maturities[idx - 1],
                    self.discount_factors[idx - 1],
                    self.maturities[idx],
                    self.discount_factors[idx],
                )),
                InterpolationMethod::LogLinear => Ok(log_linear_interpolate(
                    t,
                    self.maturities[idx - 1],
                    self.discount_factors[idx - 1],
                    self.maturities[idx],
                    self.discount_factors[idx],
                )),
                InterpolationMethod::Cubic => {
                    // The final spline does not exist yet, so fit one to the
                    // partial knot set. Err(idx) strictly between knots
                    // guarantees at least two of them.
                    let spline = CubicSpline::natural(
                        self.maturities.clone(),
                        self.discount_factors.clone(),
                    )
                    .map_err(|e| CurveError::InvalidInput(e.to_string()))?;
                    Ok(spline.interpolate(t))
                }
            },
        }
    }

    /// Interpolates between knots `idx - 1` and `idx` on the finished curve.
    fn interpolate(&self, t: f64, idx: usize) -> f64 {
        let (t1, df1) = (self.maturities[idx - 1], self.discount_factors[idx - 1]);
        let (t2, df2) = (self.maturities[idx], self.discount_factors[idx]);
        match self.method {
            InterpolationMethod::Linear => linear_interpolate(t, t1, df1, t2, df2),
            InterpolationMethod::LogLinear => log_linear_interpolate(t, t1, df1, t2, df2),
            InterpolationMethod::Cubic => match &self.spline {
                Some(spline) => spline.interpolate(t),
                None => linear_interpolate(t, t1, df1, t2, df2),
            },
        }
    }
}

/// Flat zero-rate extrapolation anchored at a single knot.
#[inline]
fn flat_extrapolate(t_knot: f64, df_knot: f64, t: f64) -> f64 {
    let zero_rate = -df_knot.ln() / t_knot;
    (-zero_rate * t).exp()
}

#[inline]
fn linear_interpolate(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    y1 + (y2 - y1) * (x - x1) / (x2 - x1)
}

/// Interpolates ln(DF) linearly, implying constant forwards between knots.
#[inline]
fn log_linear_interpolate(t: f64, t1: f64, df1: f64, t2: f64, df2: f64) -> f64 {
    linear_interpolate(t, t1, df1.ln(), t2, df2.ln()).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn sample_curve(method: InterpolationMethod) -> ZeroCouponCurve {
        ZeroCouponCurve::from_vectors(
            vec![1.0, 2.0, 3.0, 5.0],
            vec![95.0, 90.0, 85.0, 76.0],
            None,
            method,
        )
        .unwrap()
    }

    #[test]
    fn zero_coupon_knots_are_price_over_face() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        assert_abs_diff_eq!(curve.discount_factor(1.0).unwrap(), 0.95, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.discount_factor(3.0).unwrap(), 0.85, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.discount_factor(0.0).unwrap(), 1.0, epsilon = 0.0);
    }

    #[test]
    fn zero_rate_matches_discount_factor() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        let df = curve.discount_factor(2.0).unwrap();
        let r = curve.zero_rate(2.0).unwrap();
        assert_relative_eq!((-r * 2.0).exp(), df, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.zero_rate(0.0).unwrap(), 0.0, epsilon = 0.0);
    }

    #[test]
    fn log_linear_gives_constant_forwards_between_knots() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        // ln(DF) linear between 3y and 5y, so the 1y forwards over [3, 4]
        // and [4, 5] must coincide.
        let df3 = curve.discount_factor(3.0).unwrap();
        let df4 = curve.discount_factor(4.0).unwrap();
        let df5 = curve.discount_factor(5.0).unwrap();
        let f34 = (df3 / df4).ln();
        let f45 = (df4 / df5).ln();
        assert_abs_diff_eq!(f34, f45, epsilon = 1e-10);
    }

    #[test]
    fn linear_interpolation_between_knots() {
        let curve = sample_curve(InterpolationMethod::Linear);
        let df = curve.discount_factor(1.5).unwrap();
        assert_abs_diff_eq!(df, (0.95 + 0.90) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_interpolation_hits_knots_exactly() {
        let curve = sample_curve(InterpolationMethod::Cubic);
        assert_abs_diff_eq!(curve.discount_factor(2.0).unwrap(), 0.90, epsilon = 1e-12);
        let df = curve.discount_factor(2.5).unwrap();
        assert!(df < 0.90 && df > 0.85, "interior value out of range: {df}");
    }

    #[test]
    fn flat_zero_rate_extrapolation_both_ends() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        let r1 = curve.zero_rate(1.0).unwrap();
        assert_relative_eq!(
            curve.discount_factor(0.5).unwrap(),
            (-r1 * 0.5).exp(),
            epsilon = 1e-12
        );
        let r5 = curve.zero_rate(5.0).unwrap();
        assert_relative_eq!(
            curve.discount_factor(8.0).unwrap(),
            (-r5 * 8.0).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn coupon_bond_bootstrap_recovers_price() {
        // 1y and 2y zeros plus a 3y 5% annual coupon bond. Repricing the
        // coupon bond off the bootstrapped curve must recover its price.
        let securities = vec![
            Security::zero_coupon(1.0, 95.0),
            Security::zero_coupon(2.0, 90.0),
            Security::coupon_bond(3.0, 98.0, 100.0, 0.05, 1),
        ];
        let curve = ZeroCouponCurve::new(securities, InterpolationMethod::LogLinear).unwrap();

        let pv = curve
            .present_value_many(&[5.0, 5.0, 105.0], &[1.0, 2.0, 3.0])
            .unwrap();
        assert_relative_eq!(pv, 98.0, epsilon = 1e-10);
    }

    #[test]
    fn semi_annual_coupon_bond_bootstrap() {
        let securities = vec![
            Security::zero_coupon(0.5, 97.5),
            Security::zero_coupon(1.0, 95.0),
            Security::coupon_bond(2.0, 99.0, 100.0, 0.06, 2),
        ];
        let curve = ZeroCouponCurve::new(securities, InterpolationMethod::LogLinear).unwrap();

        // During the bootstrap the 1.5y coupon date lies beyond the last
        // known knot (1.0y), so the solver values it by flat zero-rate
        // extrapolation. The solved 2y knot must satisfy exactly
        //   99 = 3*DF(0.5) + 3*DF(1.0) + 3*exp(-r(1.0)*1.5) + 103*DF(2.0).
        let df_half = 0.975;
        let df_one: f64 = 0.95;
        let r_one = -df_one.ln();
        let df_coupon = (-r_one * 1.5).exp();
        let expected_df_two = (99.0 - 3.0 * (df_half + df_one + df_coupon)) / 103.0;
        assert_relative_eq!(
            curve.discount_factor(2.0).unwrap(),
            expected_df_two,
            epsilon = 1e-12
        );

        // Once the 2y knot exists, the finished curve interpolates 1.5y
        // between the 1y and 2y knots instead of extrapolating, so repricing
        // recovers the input only approximately.
        let pv = curve
            .present_value_many(&[3.0, 3.0, 3.0, 103.0], &[0.5, 1.0, 1.5, 2.0])
            .unwrap();
        assert_relative_eq!(pv, 99.0, epsilon = 0.1);
    }

    #[test]
    fn add_security_resorts_and_rebootstraps() {
        let mut curve = ZeroCouponCurve::from_vectors(
            vec![1.0, 3.0],
            vec![95.0, 85.0],
            None,
            InterpolationMethod::LogLinear,
        )
        .unwrap();
        curve.add_security(Security::zero_coupon(2.0, 90.0)).unwrap();

        assert_eq!(curve.size(), 3);
        assert_eq!(curve.maturities(), &[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(curve.discount_factor(2.0).unwrap(), 0.90, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_queries_and_inputs() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        assert!(matches!(
            curve.discount_factor(-0.5),
            Err(CurveError::NegativeMaturity(_))
        ));

        let empty = ZeroCouponCurve::new(vec![], InterpolationMethod::LogLinear).unwrap();
        assert!(matches!(empty.discount_factor(1.0), Err(CurveError::Empty)));

        assert!(ZeroCouponCurve::from_vectors(
            vec![1.0, 2.0],
            vec![95.0],
            None,
            InterpolationMethod::Linear
        )
        .is_err());

        assert!(ZeroCouponCurve::new(
            vec![
                Security::zero_coupon(1.0, 95.0),
                Security::zero_coupon(1.0, 94.0),
            ],
            InterpolationMethod::Linear
        )
        .is_err());
    }

    #[test]
    fn interpolation_method_parsing() {
        assert_eq!(
            "log_linear".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::LogLinear
        );
        assert_eq!(
            "cubic_spline".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Cubic
        );
        assert_eq!(
            "linear".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Linear
        );
        assert!(matches!(
            "quartic".parse::<InterpolationMethod>(),
            Err(CurveError::UnknownInterpolation(_))
        ));
        assert_eq!(InterpolationMethod::default(), InterpolationMethod::LogLinear);
    }

    #[test]
    fn batch_queries_match_scalar() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        let ts: Vec<f64> = (1..=250).map(|i| i as f64 * 0.025).collect();

        let dfs = curve.discount_factors_many(&ts).unwrap();
        let rates = curve.zero_rates_many(&ts).unwrap();
        for (i, &t) in ts.iter().enumerate() {
            assert_abs_diff_eq!(dfs[i], curve.discount_factor(t).unwrap(), epsilon = 0.0);
            assert_abs_diff_eq!(rates[i], curve.zero_rate(t).unwrap(), epsilon = 0.0);
        }
    }

    #[test]
    fn present_value_many_validates_lengths() {
        let curve = sample_curve(InterpolationMethod::LogLinear);
        assert!(curve.present_value_many(&[1.0, 2.0], &[1.0]).is_err());
        let pv = curve.present_value_many(&[100.0], &[1.0]).unwrap();
        assert_abs_diff_eq!(pv, 95.0, epsilon = 1e-12);
    }
}
