//! Numeric primitives shared by the pricing engines and curve machinery.
//!
//! References:
//! - Abramowitz & Stegun, *Handbook of Mathematical Functions*, 7.1.26 for the
//!   normal CDF polynomial.
//! - Press et al., *Numerical Recipes*, Ch. 2.4 and 3.3 for the tridiagonal
//!   solve and natural cubic spline.
//!
//! Numerical considerations:
//! - `normal_cdf` carries the A&S polynomial error bound (|err| < 7.5e-8),
//!   which is ample for pricing; the Monte Carlo sampling path uses the
//!   higher-accuracy routines in [`fast_norm`] instead.

pub mod fast_norm;
pub mod fast_rng;

#[derive(Debug, Clone, PartialEq)]
pub enum MathError {
    SingularSystem,
    InvalidInput(&'static str),
}

impl std::fmt::Display for MathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingularSystem => write!(f, "tridiagonal system is singular"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for MathError {}

pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

pub fn normal_cdf(x: f64) -> f64 {
    // Abramowitz & Stegun 7.1.26
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * z);
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782
                + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let approx = 1.0 - normal_pdf(z) * poly;
    if x >= 0.0 { approx } else { 1.0 - approx }
}

/// Error function via the normal CDF identity erf(x) = 2*Phi(x*sqrt(2)) - 1.
pub fn erf(x: f64) -> f64 {
    2.0 * normal_cdf(x * std::f64::consts::SQRT_2) - 1.0
}

/// Solves a tridiagonal system with the Thomas algorithm.
///
/// `lower`, `diag`, and `upper` are the sub-, main-, and super-diagonals;
/// `lower[0]` and `upper[n-1]` are ignored. O(n) time, no pivoting, so the
/// system must be diagonally dominant (spline systems always are).
pub fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
) -> Result<Vec<f64>, MathError> {
    let n = diag.len();
    if n == 0 || lower.len() != n || upper.len() != n || rhs.len() != n {
        return Err(MathError::InvalidInput(
            "tridiagonal bands and rhs must share a non-zero length",
        ));
    }

    let mut c_prime = vec![0.0_f64; n];
    let mut d_prime = vec![0.0_f64; n];

    if diag[0] == 0.0 {
        return Err(MathError::SingularSystem);
    }
    c_prime[0] = upper[0] / diag[0];
    d_prime[0] = rhs[0] / diag[0];

    for i in 1..n {
        let denom = diag[i] - lower[i] * c_prime[i - 1];
        if denom == 0.0 {
            return Err(MathError::SingularSystem);
        }
        c_prime[i] = upper[i] / denom;
        d_prime[i] = (rhs[i] - lower[i] * d_prime[i - 1]) / denom;
    }

    let mut x = d_prime;
    for i in (0..n - 1).rev() {
        x[i] -= c_prime[i] * x[i + 1];
    }
    Ok(x)
}

/// Natural cubic spline through strictly increasing knots.
///
/// Second derivatives are obtained from the standard tridiagonal system with
/// natural boundary conditions (zero curvature at both ends); evaluation is a
/// binary interval search plus the cubic Hermite form. Passes exactly through
/// every knot.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    y2: Vec<f64>,
}

impl CubicSpline {
    pub fn natural(x: Vec<f64>, y: Vec<f64>) -> Result<Self, MathError> {
        if x.len() != y.len() || x.len() < 2 {
            return Err(MathError::InvalidInput(
                "x and y must have same length >= 2",
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MathError::InvalidInput("x must be strictly increasing"));
        }

        let n = x.len();
        if n == 2 {
            // Degenerates to a straight segment.
            return Ok(Self {
                x,
                y,
                y2: vec![0.0; 2],
            });
        }

        // Interior equations: h_{i-1} y2_{i-1} + 2(h_{i-1}+h_i) y2_i + h_i y2_{i+1} = 6*ddydx.
        let m = n - 2;
        let mut lower = vec![0.0_f64; m];
        let mut diag = vec![0.0_f64; m];
        let mut upper = vec![0.0_f64; m];
        let mut rhs = vec![0.0_f64; m];

        for i in 0..m {
            let h_lo = x[i + 1] - x[i];
            let h_hi = x[i + 2] - x[i + 1];
            lower[i] = h_lo;
            diag[i] = 2.0 * (h_lo + h_hi);
            upper[i] = h_hi;
            rhs[i] = 6.0 * ((y[i + 2] - y[i + 1]) / h_hi - (y[i + 1] - y[i]) / h_lo);
        }

        let interior = solve_tridiagonal(&lower, &diag, &upper, &rhs)?;
        let mut y2 = vec![0.0_f64; n];
        y2[1..(n - 1)].copy_from_slice(&interior);

        Ok(Self { x, y, y2 })
    }

    pub fn interpolate(&self, xq: f64) -> f64 {
        let n = self.x.len();

        if xq <= self.x[0] {
            return self.y[0];
        }
        if xq >= self.x[n - 1] {
            return self.y[n - 1];
        }

        let mut klo = 0usize;
        let mut khi = n - 1;
        while khi - klo > 1 {
            let k = (khi + klo) >> 1;
            if self.x[k] > xq {
                khi = k;
            } else {
                klo = k;
            }
        }

        let h = self.x[khi] - self.x[klo];
        let a = (self.x[khi] - xq) / h;
        let b = (xq - self.x[klo]) / h;

        a * self.y[klo]
            + b * self.y[khi]
            + ((a * a * a - a) * self.y2[klo] + (b * b * b - b) * self.y2[khi]) * (h * h) / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_pdf_and_cdf_sanity() {
        assert_relative_eq!(normal_pdf(0.0), 0.398_942_280_401_432_7, epsilon = 1e-12);
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-9);
        assert_relative_eq!(normal_cdf(1.0), 0.841_344_746, epsilon = 2e-5);
        assert_relative_eq!(normal_cdf(-1.0), 1.0 - normal_cdf(1.0), epsilon = 1e-12);
    }

    #[test]
    fn erf_known_values() {
        // Tolerances reflect the polynomial's absolute error bound, not
        // machine precision.
        assert_relative_eq!(erf(0.0), 0.0, epsilon = 1e-8);
        assert_relative_eq!(erf(1.0), 0.842_700_79, epsilon = 1e-6);
        assert_relative_eq!(erf(-1.0), -erf(1.0), epsilon = 1e-8);
    }

    #[test]
    fn tridiagonal_solves_known_system() {
        // [2 1 0; 1 2 1; 0 1 2] x = [4, 8, 8] -> x = [1, 2, 3]
        let x = solve_tridiagonal(
            &[0.0, 1.0, 1.0],
            &[2.0, 2.0, 2.0],
            &[1.0, 1.0, 0.0],
            &[4.0, 8.0, 8.0],
        )
        .unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_spline_interpolates_nodes() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![0.0, 1.0, 4.0, 9.0];
        let spline = CubicSpline::natural(x.clone(), y.clone()).unwrap();

        for (&xi, &yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(spline.interpolate(xi), yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn cubic_spline_two_points_is_linear() {
        let spline = CubicSpline::natural(vec![0.0, 2.0], vec![1.0, 3.0]).unwrap();
        assert_relative_eq!(spline.interpolate(1.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_spline_rejects_unsorted_knots() {
        assert!(CubicSpline::natural(vec![0.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(CubicSpline::natural(vec![1.0], vec![1.0]).is_err());
    }
}
