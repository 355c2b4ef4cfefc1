//! Shared vocabulary types and the error taxonomy.

pub mod error;
pub mod types;

pub use error::{CurveError, PricingError};
pub use types::{ExerciseStyle, OptionType};
