//! Reproducible particle configurations.
//!
//! All generators draw from a seeded `ChaCha8Rng`, so a failing test can
//! be replayed exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stokes_core::Parameters;

/// `n` particles uniform in `[0, extent)³`.
pub fn random_positions(n: usize, extent: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..3 * n).map(|_| rng.random::<f64>() * extent).collect()
}

/// `n` particles uniform in `[0, extent)³` with pairwise distance at
/// least `min_separation`, by rejection.
///
/// Gives up after a bounded number of draws and returns fewer particles
/// if the box is too crowded.
pub fn separated_positions(n: usize, extent: f64, min_separation: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out: Vec<f64> = Vec::with_capacity(3 * n);
    let min2 = min_separation * min_separation;
    let mut attempts = 0;
    while out.len() < 3 * n && attempts < 10_000 * n.max(1) {
        attempts += 1;
        let p = [(); 3].map(|_| rng.random::<f64>() * extent);
        let clear = out.chunks_exact(3).all(|q| {
            let d: f64 = q.iter().zip(&p).map(|(a, b)| (a - b) * (a - b)).sum();
            d >= min2
        });
        if clear {
            out.extend_from_slice(&p);
        }
    }
    out
}

/// Shift every particle up by `height` along z.
pub fn lift(positions: &mut [f64], height: f64) {
    for p in positions.chunks_exact_mut(3) {
        p[2] += height;
    }
}

/// Unit temperature, viscosity and radius for `n` particles.
pub fn unit_parameters(n: usize) -> Parameters {
    Parameters::new(1.0, 1.0, 1.0, n)
}

/// All-ones force vector for `n` particles.
pub fn unit_forces(n: usize) -> Vec<f64> {
    vec![1.0; 3 * n]
}
