//! Lattice pricing engines.

pub mod binomial;
