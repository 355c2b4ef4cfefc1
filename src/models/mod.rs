//! Stochastic process descriptors and path generation.
//!
//! Each descriptor is an immutable parameter bundle; every generation call
//! draws fresh randomness from the generator it is handed, so descriptors can
//! be shared freely across threads.
//!
//! References:
//! - Glasserman, *Monte Carlo Methods in Financial Engineering*, Ch. 3 and 6.
//! - Lord, Koekkoek & van Dijk (2010) for the full-truncation Heston scheme.
//!
//! Numerical considerations:
//! - GBM uses the exact log-Euler step, so discretization introduces no bias
//!   in the terminal distribution.
//! - The Heston variance is floored at zero each step (full truncation);
//!   price paths stay positive by construction of the exponential step.

use crate::math::fast_rng::{stream_seed, StochasticRng, Xoshiro256PlusPlus};

use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Paths per worker block for parallel terminal sampling. Fixed so a seeded
/// run produces identical output at any thread count.
const BLOCK_PATHS: usize = 4096;

/// Standard Wiener process over `[0, time_horizon]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrownianMotion {
    pub time_horizon: f64,
    pub num_steps: usize,
}

impl BrownianMotion {
    /// Panics if `time_horizon <= 0` or `num_steps == 0`; both are structural
    /// misuse rather than data errors.
    pub fn new(time_horizon: f64, num_steps: usize) -> Self {
        assert!(time_horizon > 0.0, "time_horizon must be positive");
        assert!(num_steps >= 1, "num_steps must be at least 1");
        Self {
            time_horizon,
            num_steps,
        }
    }

    pub fn dt(&self) -> f64 {
        self.time_horizon / self.num_steps as f64
    }

    /// The `num_steps + 1` equally spaced sample times, starting at 0.
    pub fn time_grid(&self) -> Vec<f64> {
        let dt = self.dt();
        (0..=self.num_steps).map(|i| i as f64 * dt).collect()
    }

    /// One path of length `num_steps + 1` with W(0) = 0.
    pub fn path(&self, rng: &mut StochasticRng) -> Vec<f64> {
        let sqrt_dt = self.dt().sqrt();
        let mut w = Vec::with_capacity(self.num_steps + 1);
        w.push(0.0);
        let mut current = 0.0;
        for _ in 0..self.num_steps {
            current += sqrt_dt * rng.standard_normal();
            w.push(current);
        }
        w
    }

    /// A path and its sign-flipped mirror built from the same draws, for
    /// antithetic variance reduction.
    pub fn antithetic_paths(&self, rng: &mut StochasticRng) -> (Vec<f64>, Vec<f64>) {
        let path = self.path(rng);
        let mirror = path.iter().map(|w| -w).collect();
        (path, mirror)
    }
}

/// Geometric Brownian motion dS = mu S dt + sigma S dW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricBrownianMotion {
    pub spot: f64,
    pub drift: f64,
    pub volatility: f64,
    pub time_horizon: f64,
    pub num_steps: usize,
}

impl GeometricBrownianMotion {
    pub fn new(spot: f64, drift: f64, volatility: f64, time_horizon: f64, num_steps: usize) -> Self {
        assert!(spot > 0.0, "spot must be positive");
        assert!(volatility >= 0.0, "volatility must be non-negative");
        assert!(time_horizon > 0.0, "time_horizon must be positive");
        assert!(num_steps >= 1, "num_steps must be at least 1");
        Self {
            spot,
            drift,
            volatility,
            time_horizon,
            num_steps,
        }
    }

    pub fn dt(&self) -> f64 {
        self.time_horizon / self.num_steps as f64
    }

    pub fn time_grid(&self) -> Vec<f64> {
        let dt = self.dt();
        (0..=self.num_steps).map(|i| i as f64 * dt).collect()
    }

    /// Exact log-Euler step.
    #[inline]
    fn step(&self, s: f64, dt: f64, z: f64) -> f64 {
        s * ((self.drift - 0.5 * self.volatility * self.volatility) * dt
            + self.volatility * dt.sqrt() * z)
            .exp()
    }

    /// One price path of length `num_steps + 1` starting at `spot`. Strictly
    /// positive for finite draws.
    pub fn path(&self, rng: &mut StochasticRng) -> Vec<f64> {
        let dt = self.dt();
        let mut prices = Vec::with_capacity(self.num_steps + 1);
        let mut s = self.spot;
        prices.push(s);
        for _ in 0..self.num_steps {
            s = self.step(s, dt, rng.standard_normal());
            prices.push(s);
        }
        prices
    }

    /// Terminal price of one path without storing intermediates.
    fn terminal(&self, rng: &mut Xoshiro256PlusPlus) -> f64 {
        let dt = self.dt();
        let mut s = self.spot;
        for _ in 0..self.num_steps {
            s = self.step(s, dt, rng.standard_normal());
        }
        s
    }

    /// Terminal prices of `n` independent paths.
    ///
    /// With a seed the result is deterministic and independent of thread
    /// count: paths are cut into fixed-size blocks, each block drawing from
    /// its own derived stream.
    pub fn terminal_prices(&self, n: usize, seed: Option<u64>) -> Vec<f64> {
        let base = seed.unwrap_or_else(|| rand::rng().random::<u64>());
        let mut out = vec![0.0_f64; n];
        fill_blocks(&mut out, base, |rng, slot| *slot = self.terminal(rng));
        out
    }

    /// Terminal prices of `n_pairs` antithetic path pairs: each pair steps
    /// through the same draws with opposite signs. Same block/stream layout
    /// as [`GeometricBrownianMotion::terminal_prices`].
    pub fn antithetic_terminal_pairs(&self, n_pairs: usize, seed: Option<u64>) -> Vec<(f64, f64)> {
        let base = seed.unwrap_or_else(|| rand::rng().random::<u64>());
        let dt = self.dt();
        let mut out = vec![(0.0_f64, 0.0_f64); n_pairs];
        fill_blocks(&mut out, base, |rng, slot| {
            let mut s_plus = self.spot;
            let mut s_minus = self.spot;
            for _ in 0..self.num_steps {
                let z = rng.standard_normal();
                s_plus = self.step(s_plus, dt, z);
                s_minus = self.step(s_minus, dt, -z);
            }
            *slot = (s_plus, s_minus);
        });
        out
    }
}

/// Heston stochastic-volatility process.
///
/// dS = mu S dt + sqrt(v) S dW_s, dv = kappa (theta - v) dt + xi sqrt(v) dW_v,
/// corr(dW_s, dW_v) = rho.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HestonProcess {
    pub spot: f64,
    pub initial_variance: f64,
    pub drift: f64,
    pub kappa: f64,
    pub theta: f64,
    pub vol_of_vol: f64,
    pub correlation: f64,
    pub time_horizon: f64,
    pub num_steps: usize,
}

impl HestonProcess {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spot: f64,
        initial_variance: f64,
        drift: f64,
        kappa: f64,
        theta: f64,
        vol_of_vol: f64,
        correlation: f64,
        time_horizon: f64,
        num_steps: usize,
    ) -> Self {
        assert!(spot > 0.0, "spot must be positive");
        assert!(initial_variance >= 0.0, "initial_variance must be non-negative");
        assert!(vol_of_vol >= 0.0, "vol_of_vol must be non-negative");
        assert!(
            (-1.0..=1.0).contains(&correlation),
            "correlation must lie in [-1, 1]"
        );
        assert!(time_horizon > 0.0, "time_horizon must be positive");
        assert!(num_steps >= 1, "num_steps must be at least 1");
        Self {
            spot,
            initial_variance,
            drift,
            kappa,
            theta,
            vol_of_vol,
            correlation,
            time_horizon,
            num_steps,
        }
    }

    pub fn dt(&self) -> f64 {
        self.time_horizon / self.num_steps as f64
    }

    /// Whether 2*kappa*theta >= xi^2. When violated the discretized variance
    /// hits zero often and the truncation floor does more work.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa * self.theta >= self.vol_of_vol * self.vol_of_vol
    }

    /// One full-truncation step of (price, variance).
    #[inline]
    fn step(&self, s: f64, v: f64, dt: f64, z_s: f64, z_v: f64) -> (f64, f64) {
        let v_pos = v.max(0.0);
        let sqrt_v_dt = (v_pos * dt).sqrt();
        let v_next = (v + self.kappa * (self.theta - v_pos) * dt
            + self.vol_of_vol * sqrt_v_dt * z_v)
            .max(0.0);
        let s_next = s * ((self.drift - 0.5 * v_pos) * dt + sqrt_v_dt * z_s).exp();
        (s_next, v_next)
    }

    #[inline]
    fn correlated_draws(&self, rng: &mut Xoshiro256PlusPlus) -> (f64, f64) {
        let z_v = rng.standard_normal();
        let z_perp = rng.standard_normal();
        let z_s = self.correlation * z_v
            + (1.0 - self.correlation * self.correlation).max(0.0).sqrt() * z_perp;
        (z_s, z_v)
    }

    /// One joint path; both vectors have length `num_steps + 1`. Price stays
    /// positive, variance non-negative at every node.
    pub fn path(&self, rng: &mut StochasticRng) -> (Vec<f64>, Vec<f64>) {
        let dt = self.dt();
        let mut prices = Vec::with_capacity(self.num_steps + 1);
        let mut variances = Vec::with_capacity(self.num_steps + 1);
        let mut s = self.spot;
        let mut v = self.initial_variance;
        prices.push(s);
        variances.push(v);
        for _ in 0..self.num_steps {
            let z_v = rng.standard_normal();
            let z_perp = rng.standard_normal();
            let z_s = self.correlation * z_v
                + (1.0 - self.correlation * self.correlation).max(0.0).sqrt() * z_perp;
            let (s_next, v_next) = self.step(s, v, dt, z_s, z_v);
            s = s_next;
            v = v_next;
            prices.push(s);
            variances.push(v);
        }
        (prices, variances)
    }

    fn terminal(&self, rng: &mut Xoshiro256PlusPlus) -> (f64, f64) {
        let dt = self.dt();
        let mut s = self.spot;
        let mut v = self.initial_variance;
        for _ in 0..self.num_steps {
            let (z_s, z_v) = self.correlated_draws(rng);
            let (s_next, v_next) = self.step(s, v, dt, z_s, z_v);
            s = s_next;
            v = v_next;
        }
        (s, v)
    }

    /// Terminal (price, variance) of `n` independent simulations, returned as
    /// two parallel vectors. Deterministic for a given seed at any thread
    /// count, like [`GeometricBrownianMotion::terminal_prices`].
    pub fn terminal_values(&self, n: usize, seed: Option<u64>) -> (Vec<f64>, Vec<f64>) {
        let base = seed.unwrap_or_else(|| rand::rng().random::<u64>());
        let mut pairs = vec![(0.0_f64, 0.0_f64); n];
        fill_blocks(&mut pairs, base, |rng, slot| *slot = self.terminal(rng));
        pairs.into_iter().unzip()
    }
}

/// Fills `out` in fixed-size blocks, each block drawing from its own stream
/// derived from `base` and the block index. Parallel when the feature is on;
/// the block/stream layout is identical either way.
fn fill_blocks<T, F>(out: &mut [T], base: u64, fill_one: F)
where
    T: Send,
    F: Fn(&mut Xoshiro256PlusPlus, &mut T) + Sync,
{
    let fill_block = |(block_idx, block): (usize, &mut [T])| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(stream_seed(base, block_idx));
        for slot in block {
            fill_one(&mut rng, slot);
        }
    };

    #[cfg(feature = "parallel")]
    {
        out.par_chunks_mut(BLOCK_PATHS).enumerate().for_each(fill_block);
    }
    #[cfg(not(feature = "parallel"))]
    {
        out.chunks_mut(BLOCK_PATHS).enumerate().for_each(fill_block);
    }
}
