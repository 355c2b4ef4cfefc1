//! Forward rates derived from a zero-coupon curve.

use crate::core::CurveError;
use crate::rates::yield_curve::ZeroCouponCurve;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
const PARALLEL_CUTOFF: usize = 100;

/// Step used by the finite-difference instantaneous forward rate.
const INSTANTANEOUS_DT: f64 = 1e-4;

/// Borrowed view over a [`ZeroCouponCurve`] answering forward-rate queries.
///
/// Holds a reference to the base curve and never copies its knots.
#[derive(Debug, Clone, Copy)]
pub struct ForwardCurve<'a> {
    base: &'a ZeroCouponCurve,
}

impl<'a> ForwardCurve<'a> {
    pub fn new(base: &'a ZeroCouponCurve) -> Self {
        Self { base }
    }

    /// The underlying zero-coupon curve.
    pub fn base_curve(&self) -> &ZeroCouponCurve {
        self.base
    }

    /// Continuously compounded forward rate over `[t1, t2]`.
    ///
    /// `f(t1, t2) = ln(DF(t1) / DF(t2)) / (t2 - t1)`, requiring
    /// `0 <= t1 < t2`.
    pub fn forward_rate(&self, t1: f64, t2: f64) -> Result<f64, CurveError> {
        self.check_interval(t1, t2)?;
        let df1 = self.base.discount_factor(t1)?;
        let df2 = self.base.discount_factor(t2)?;
        Ok((df1 / df2).ln() / (t2 - t1))
    }

    /// Discount factor over the forward interval, `DF(t2) / DF(t1)`.
    pub fn forward_discount_factor(&self, t1: f64, t2: f64) -> Result<f64, CurveError> {
        self.check_interval(t1, t2)?;
        let df1 = self.base.discount_factor(t1)?;
        let df2 = self.base.discount_factor(t2)?;
        Ok(df2 / df1)
    }

    /// Forward price at `t1` of a zero-coupon bond maturing at `t2`.
    pub fn forward_bond_price(
        &self,
        t1: f64,
        t2: f64,
        face_value: f64,
    ) -> Result<f64, CurveError> {
        Ok(face_value * self.forward_discount_factor(t1, t2)?)
    }

    /// Instantaneous forward rate `f(t) = -d ln(DF(t)) / dt`.
    ///
    /// Central finite difference with a fixed step; near zero a one-sided
    /// stencil avoids querying negative maturities.
    pub fn instantaneous_forward_rate(&self, t: f64) -> Result<f64, CurveError> {
        if t < 0.0 {
            return Err(CurveError::NegativeMaturity(t));
        }

        let dt = INSTANTANEOUS_DT;
        if t < dt {
            let df1 = self.base.discount_factor(dt)?;
            let df2 = self.base.discount_factor(2.0 * dt)?;
            return Ok((df1 / df2).ln() / dt);
        }

        let df_minus = self.base.discount_factor(t - dt)?;
        let df_plus = self.base.discount_factor(t + dt)?;
        Ok((df_minus / df_plus).ln() / (2.0 * dt))
    }

    /// Forward rates for paired `(start, end)` intervals, order preserved.
    pub fn forward_rates_many(
        &self,
        start_times: &[f64],
        end_times: &[f64],
    ) -> Result<Vec<f64>, CurveError> {
        if start_times.len() != end_times.len() {
            return Err(CurveError::InvalidInput(format!(
                "start and end times must have the same length, got {} and {}",
                start_times.len(),
                end_times.len()
            )));
        }

        #[cfg(feature = "parallel")]
        if start_times.len() > PARALLEL_CUTOFF {
            return start_times
                .par_iter()
                .zip(end_times.par_iter())
                .map(|(&t1, &t2)| self.forward_rate(t1, t2))
                .collect();
        }

        start_times
            .iter()
            .zip(end_times.iter())
            .map(|(&t1, &t2)| self.forward_rate(t1, t2))
            .collect()
    }

    /// Consecutive forward rates of width `step` over `[start, end]`.
    ///
    /// Returns interval start times and the matching forward rates. The last
    /// interval is clipped at `end`.
    pub fn term_structure(
        &self,
        start: f64,
        end: f64,
        step: f64,
    ) -> Result<(Vec<f64>, Vec<f64>), CurveError> {
        if start < 0.0 || end <= start || step <= 0.0 {
            return Err(CurveError::InvalidInput(format!(
                "term structure requires 0 <= start < end and step > 0, \
                 got start={start}, end={end}, step={step}"
            )));
        }

        let mut times = Vec::new();
        let mut rates = Vec::new();
        let mut t1 = start;
        while t1 < end {
            let t2 = (t1 + step).min(end);
            times.push(t1);
            rates.push(self.forward_rate(t1, t2)?);
            t1 += step;
        }
        Ok((times, rates))
    }

    fn check_interval(&self, t1: f64, t2: f64) -> Result<(), CurveError> {
        if t1 < 0.0 || t2 <= t1 {
            return Err(CurveError::InvalidForwardInterval { t1, t2 });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::yield_curve::InterpolationMethod;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn flat_5pct_curve() -> ZeroCouponCurve {
        // Prices of exp(-0.05 t) * 100 at each knot give a flat 5% curve.
        let maturities: Vec<f64> = vec![1.0, 2.0, 3.0, 5.0, 10.0];
        let prices = maturities
            .iter()
            .map(|t| 100.0 * (-0.05 * t).exp())
            .collect();
        ZeroCouponCurve::from_vectors(maturities, prices, None, InterpolationMethod::LogLinear)
            .unwrap()
    }

    #[test]
    fn flat_curve_forwards_equal_the_zero_rate() {
        let curve = flat_5pct_curve();
        let fwd = ForwardCurve::new(&curve);

        assert_relative_eq!(fwd.forward_rate(1.0, 2.0).unwrap(), 0.05, epsilon = 1e-10);
        assert_relative_eq!(fwd.forward_rate(2.0, 7.5).unwrap(), 0.05, epsilon = 1e-10);
        assert_relative_eq!(
            fwd.instantaneous_forward_rate(3.0).unwrap(),
            0.05,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            fwd.instantaneous_forward_rate(0.0).unwrap(),
            0.05,
            epsilon = 1e-6
        );
    }

    #[test]
    fn forward_discount_factor_composes() {
        let curve = flat_5pct_curve();
        let fwd = ForwardCurve::new(&curve);

        let df1 = curve.discount_factor(1.0).unwrap();
        let fdf = fwd.forward_discount_factor(1.0, 3.0).unwrap();
        assert_relative_eq!(
            df1 * fdf,
            curve.discount_factor(3.0).unwrap(),
            epsilon = 1e-12
        );

        let price = fwd.forward_bond_price(1.0, 3.0, 100.0).unwrap();
        assert_relative_eq!(price, 100.0 * fdf, epsilon = 1e-12);
    }

    #[test]
    fn rejects_degenerate_intervals() {
        let curve = flat_5pct_curve();
        let fwd = ForwardCurve::new(&curve);

        assert!(matches!(
            fwd.forward_rate(2.0, 2.0),
            Err(CurveError::InvalidForwardInterval { .. })
        ));
        assert!(matches!(
            fwd.forward_rate(-1.0, 2.0),
            Err(CurveError::InvalidForwardInterval { .. })
        ));
        assert!(matches!(
            fwd.instantaneous_forward_rate(-0.5),
            Err(CurveError::NegativeMaturity(_))
        ));
        assert!(fwd.term_structure(0.0, 0.0, 1.0).is_err());
        assert!(fwd.forward_rates_many(&[1.0], &[2.0, 3.0]).is_err());
    }

    #[test]
    fn term_structure_covers_the_interval() {
        let curve = flat_5pct_curve();
        let fwd = ForwardCurve::new(&curve);

        let (times, rates) = fwd.term_structure(0.0, 5.0, 1.0).unwrap();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        for r in rates {
            assert_relative_eq!(r, 0.05, epsilon = 1e-10);
        }

        // Step not dividing the interval clips the final bucket.
        let (times, rates) = fwd.term_structure(0.0, 2.5, 1.0).unwrap();
        assert_eq!(times.len(), 3);
        assert_abs_diff_eq!(times[2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(rates[2], 0.05, epsilon = 1e-10);
    }

    #[test]
    fn batch_forward_rates_match_scalar() {
        let curve = flat_5pct_curve();
        let fwd = ForwardCurve::new(&curve);

        let starts: Vec<f64> = (0..150).map(|i| i as f64 * 0.05).collect();
        let ends: Vec<f64> = starts.iter().map(|t| t + 0.5).collect();
        let rates = fwd.forward_rates_many(&starts, &ends).unwrap();
        for (i, (&t1, &t2)) in starts.iter().zip(ends.iter()).enumerate() {
            assert_abs_diff_eq!(
                rates[i],
                fwd.forward_rate(t1, t2).unwrap(),
                epsilon = 0.0
            );
        }
    }
}
