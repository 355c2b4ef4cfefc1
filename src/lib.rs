//! FerriQuant is a derivatives pricing library covering vanilla-option
//! analytics, lattice and Monte Carlo engines, stochastic-process simulation,
//! and zero-coupon curve construction.
//!
//! The crate layers closed-form Black-Scholes-Merton pricing (with batch SIMD
//! kernels), CRR binomial pricing for American exercise, path simulators for
//! Brownian motion, geometric Brownian motion, and Heston dynamics, Monte
//! Carlo pricers with variance-reduction options, and a bootstrapped
//! zero-coupon yield curve with forward-rate views.
//!
//! References used across modules include:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 13, 15, 21.
//! - Cox, Ross, and Rubinstein (1979) for the binomial lattice.
//! - Glasserman (2004) for Monte Carlo estimators and variance reduction.
//! - Longstaff and Schwartz (2001) for regression-based early exercise.
//! - Abramowitz and Stegun 7.1.26 for the normal CDF polynomial.
//!
//! Numerical considerations:
//! - Batch pricing uses the same CDF polynomial in SIMD lanes and scalar code,
//!   so batch and scalar results agree to tight tolerances.
//! - Seeded simulations are reproducible bit for bit, including under the
//!   `parallel` feature: work is split into fixed-size blocks with per-block
//!   seed streams, so results do not depend on thread count.
//! - Degenerate inputs (zero volatility, expired options) fall back to
//!   discounted-intrinsic closed forms instead of producing NaN.
//!
//! # Feature Flags
//! - `parallel`: Rayon-powered batch pricing and path generation.
//! - `simd`: 4-wide SIMD kernels for batch Black-Scholes pricing.
//!
//! # Quick Start
//! Price a European call and its Greeks:
//! ```rust
//! use ferriquant::instruments::EuropeanOption;
//!
//! let opt = EuropeanOption::call(100.0, 100.0, 0.25, 0.05, 0.2).unwrap();
//! let g = opt.greeks();
//! assert!(g.price > 4.0 && g.price < 5.0);
//! assert!(g.delta > 0.0 && g.gamma > 0.0);
//! ```
//!
//! Price an American put on a binomial lattice:
//! ```rust
//! use ferriquant::instruments::AmericanOption;
//!
//! let opt = AmericanOption::put(100.0, 110.0, 1.0, 0.05, 0.2).unwrap();
//! let px = opt.price().unwrap();
//! assert!(px > 10.0);
//! ```
//!
//! Bootstrap a discount curve and read forward rates:
//! ```rust
//! use ferriquant::rates::{ForwardCurve, InterpolationMethod, ZeroCouponCurve};
//!
//! let curve = ZeroCouponCurve::from_vectors(
//!     vec![1.0, 2.0, 5.0],
//!     vec![95.0, 90.0, 78.0],
//!     None,
//!     InterpolationMethod::LogLinear,
//! )
//! .unwrap();
//! let fwd = ForwardCurve::new(&curve);
//! assert!(fwd.forward_rate(1.0, 2.0).unwrap() > 0.0);
//! ```
//!
//! Simulate Heston terminal values with a fixed seed:
//! ```rust
//! use ferriquant::models::HestonProcess;
//!
//! let heston = HestonProcess::new(100.0, 0.04, 0.05, 2.0, 0.04, 0.3, -0.7, 1.0, 252);
//! let (prices, variances) = heston.terminal_values(1_000, Some(42));
//! assert_eq!(prices.len(), 1_000);
//! assert!(variances.iter().all(|&v| v >= 0.0));
//! ```

pub mod core;
pub mod engines;
pub mod instruments;
pub mod math;
pub mod mc;
pub mod models;
pub mod rates;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::{CurveError, ExerciseStyle, OptionType, PricingError};
    pub use crate::instruments::{AmericanOption, EuropeanOption, OptionGreeks};
    pub use crate::models::{BrownianMotion, GeometricBrownianMotion, HestonProcess};
    pub use crate::rates::{ForwardCurve, InterpolationMethod, Security, ZeroCouponCurve};
}
