//! Zero-coupon curve bootstrapping and forward-rate views.
//!
//! [`ZeroCouponCurve`] bootstraps discount factors from market prices of
//! zero-coupon and coupon-bearing bonds, then answers discount-factor and
//! zero-rate queries under a configurable interpolation method.
//! [`ForwardCurve`] is a borrowed view deriving forward rates from a base
//! curve without duplicating its data.

pub mod forward;
pub mod yield_curve;

pub use forward::ForwardCurve;
pub use yield_curve::{InterpolationMethod, Security, ZeroCouponCurve};
