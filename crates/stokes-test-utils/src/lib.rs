//! Test utilities for stokes development.
//!
//! Dense assembly of the mobility matrix from repeated `mdot` calls,
//! symmetry and covariance checks, reproducible particle configurations
//! and the [`compliance`] runner that checks the shared contract against
//! any [`Mobility`] implementation.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod compliance;
pub mod fixtures;

use stokes_core::{MobilityError, Scalar};
use stokes_solver::Mobility;

/// Assemble the dense `3N × 3N` mobility matrix, row-major, in `f64`.
///
/// Column `j` is `M e_j`. The solver must be ready with positions set.
pub fn mobility_matrix<T: Scalar, M: Mobility<T>>(solver: &mut M) -> Result<Vec<f64>, MobilityError> {
    let dim = 3 * solver.number_particles().unwrap_or(0);
    let mut matrix = vec![0.0; dim * dim];
    let mut unit = vec![0.0f64; dim];
    for j in 0..dim {
        unit[j] = 1.0;
        let column = solver.mdot(&unit, false)?.velocities;
        unit[j] = 0.0;
        for (i, v) in column.into_iter().enumerate() {
            matrix[i * dim + j] = v.to_real();
        }
    }
    Ok(matrix)
}

/// Largest entry magnitude.
pub fn max_abs(matrix: &[f64]) -> f64 {
    matrix.iter().fold(0.0, |m, v| m.max(v.abs()))
}

/// `max |M_ij − M_ji|` relative to `max |M_ij|`.
pub fn relative_asymmetry(matrix: &[f64], dim: usize) -> f64 {
    let scale = max_abs(matrix);
    if scale == 0.0 {
        return 0.0;
    }
    let mut worst: f64 = 0.0;
    for i in 0..dim {
        for j in i + 1..dim {
            worst = worst.max((matrix[i * dim + j] - matrix[j * dim + i]).abs());
        }
    }
    worst / scale
}

/// Panic unless `matrix` is symmetric to relative tolerance `tol`.
#[track_caller]
pub fn assert_symmetric(matrix: &[f64], dim: usize, tol: f64) {
    let asym = relative_asymmetry(matrix, dim);
    assert!(asym <= tol, "relative asymmetry {asym:e} exceeds {tol:e}");
}

/// Frobenius norm of `a − b` relative to that of `b`.
pub fn relative_difference(a: &[f64], b: &[f64]) -> f64 {
    let diff: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    let norm: f64 = b.iter().map(|y| y * y).sum();
    (diff / norm).sqrt()
}

/// Empirical covariance of `sqrt_mdot_w(1.0)` over `samples` draws.
///
/// Approaches `2 k_B T M` for a correct sampler.
pub fn noise_covariance<T: Scalar, M: Mobility<T>>(
    solver: &mut M,
    samples: usize,
) -> Result<Vec<f64>, MobilityError> {
    let dim = 3 * solver.number_particles().unwrap_or(0);
    let mut cov = vec![0.0; dim * dim];
    for _ in 0..samples {
        let w: Vec<f64> = solver
            .sqrt_mdot_w(1.0)?
            .linear
            .into_iter()
            .map(Scalar::to_real)
            .collect();
        for i in 0..dim {
            for j in 0..dim {
                cov[i * dim + j] += w[i] * w[j];
            }
        }
    }
    let inv = 1.0 / samples.max(1) as f64;
    cov.iter_mut().for_each(|c| *c *= inv);
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asymmetry_of_symmetric_matrix_is_zero() {
        let m = [2.0, 1.0, 1.0, 3.0];
        assert_eq!(relative_asymmetry(&m, 2), 0.0);
        assert_symmetric(&m, 2, 0.0);
    }

    #[test]
    fn asymmetry_is_relative() {
        let m = [4.0, 1.0, 0.0, 4.0];
        assert_eq!(relative_asymmetry(&m, 2), 0.25);
    }

    #[test]
    #[should_panic(expected = "relative asymmetry")]
    fn assert_symmetric_panics() {
        assert_symmetric(&[1.0, 1.0, 0.0, 1.0], 2, 1e-3);
    }

    #[test]
    fn relative_difference_of_equal_is_zero() {
        assert_eq!(relative_difference(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert!((relative_difference(&[0.0, 2.0], &[0.0, 1.0]) - 1.0).abs() < 1e-15);
    }
}
