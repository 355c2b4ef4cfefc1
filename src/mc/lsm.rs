//! Longstaff-Schwartz regression pricing for American puts.
//!
//! Reference: Longstaff & Schwartz (2001). Continuation values are fitted on
//! in-the-money paths with a {1, S, S^2} basis; exercise happens where the
//! intrinsic value beats the fitted continuation. Biased low relative to a
//! fine binomial tree, but within a few cents at reasonable path counts.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::core::PricingError;

/// Prices an American put by least-squares Monte Carlo.
#[allow(clippy::too_many_arguments)]
pub fn american_put_lsm(
    spot: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    expiry: f64,
    steps: usize,
    paths: usize,
    seed: u64,
) -> Result<f64, PricingError> {
    if steps < 2 {
        return Err(PricingError::InvalidInput(
            "lsm needs at least 2 exercise dates".to_string(),
        ));
    }
    if paths < 3 {
        return Err(PricingError::InvalidInput(
            "lsm regression needs at least 3 paths".to_string(),
        ));
    }

    let dt = expiry / steps as f64;
    let drift = (rate - 0.5 * vol * vol) * dt;
    let diffusion = vol * dt.sqrt();
    let disc = (-rate * dt).exp();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = vec![vec![0.0_f64; steps + 1]; paths];
    for path in &mut grid {
        path[0] = spot;
        for ti in 1..=steps {
            let z: f64 = StandardNormal.sample(&mut rng);
            path[ti] = path[ti - 1] * (drift + diffusion * z).exp();
        }
    }

    let mut values: Vec<f64> = grid.iter().map(|p| (strike - p[steps]).max(0.0)).collect();

    for ti in (1..steps).rev() {
        for v in &mut values {
            *v *= disc;
        }

        let itm: Vec<usize> = (0..paths).filter(|&i| strike > grid[i][ti]).collect();
        if itm.len() < 3 {
            continue;
        }

        let mut basis = DMatrix::<f64>::zeros(itm.len(), 3);
        let mut target = DVector::<f64>::zeros(itm.len());
        for (row, &i) in itm.iter().enumerate() {
            let s = grid[i][ti];
            basis[(row, 0)] = 1.0;
            basis[(row, 1)] = s;
            basis[(row, 2)] = s * s;
            target[row] = values[i];
        }

        let gram = basis.transpose() * &basis;
        let moment = basis.transpose() * &target;
        let Some(beta) = gram.lu().solve(&moment) else {
            // Degenerate regression (e.g. all ITM spots equal); keep holding.
            continue;
        };

        for &i in &itm {
            let s = grid[i][ti];
            let continuation = beta[0] + beta[1] * s + beta[2] * s * s;
            let exercise = strike - s;
            if exercise > continuation {
                values[i] = exercise;
            }
        }
    }

    Ok(values.iter().sum::<f64>() * disc / paths as f64)
}
