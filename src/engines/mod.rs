//! Pricing engines, grouped by method.

pub mod analytic;
pub mod numerical;
