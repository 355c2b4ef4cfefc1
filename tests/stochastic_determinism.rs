//! Seeded simulations must not depend on the rayon pool size.
//!
//! Path generation splits work into fixed-size blocks with per-block seed
//! streams, so the same seed must produce bit-identical output on one
//! thread and on many.

#![cfg(feature = "parallel")]

use ferriquant::models::{GeometricBrownianMotion, HestonProcess};
use rayon::ThreadPoolBuilder;

#[test]
fn gbm_terminal_prices_are_thread_count_independent() {
    let gbm = GeometricBrownianMotion::new(100.0, 0.05, 0.2, 1.0, 16);

    let single = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let many = ThreadPoolBuilder::new().num_threads(8).build().unwrap();

    let a = single.install(|| gbm.terminal_prices(20_000, Some(42)));
    let b = many.install(|| gbm.terminal_prices(20_000, Some(42)));

    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}

#[test]
fn heston_terminal_values_are_thread_count_independent() {
    let heston = HestonProcess::new(100.0, 0.04, 0.05, 2.0, 0.04, 0.3, -0.7, 1.0, 64);

    let single = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let many = ThreadPoolBuilder::new().num_threads(8).build().unwrap();

    let (pa, va) = single.install(|| heston.terminal_values(10_000, Some(9)));
    let (pb, vb) = many.install(|| heston.terminal_values(10_000, Some(9)));

    for (x, y) in pa.iter().zip(pb.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    for (x, y) in va.iter().zip(vb.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
}
