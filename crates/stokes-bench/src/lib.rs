//! Benchmark profiles and utilities for the stokes solvers.
//!
//! Provides ready-to-evaluate solver profiles for benchmarks and examples:
//!
//! - [`open_profile`]: all-pairs RPY in unbounded fluid
//! - [`wall_profile`]: all-pairs RPY above a no-slip wall
//! - [`periodic_profile`]: spectral RPY in a cubic periodic box
//! - [`lattice_positions`]: deterministic jittered particle placement

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use stokes_core::{MobilityError, Parameters, Periodicity, Scalar};
use stokes_solver::Mobility;
use stokes_solvers::{Solver, SolverKind, SpectralRpyOptions};

/// Lattice spacing in units of the radius.
pub const SPACING: f64 = 4.0;

/// Wavenumber cutoff used by [`periodic_profile`].
pub const PERIODIC_CUTOFF: f64 = 4.0;

/// Particles per edge of the smallest cube holding `n` lattice sites.
pub fn lattice_side(n: usize) -> usize {
    let mut side = 1;
    while side * side * side < n {
        side += 1;
    }
    side
}

/// Uniform in `[0, 1)` from a fixed multiplicative hash of `(seed, i)`.
fn unit_hash(seed: u64, i: usize) -> f64 {
    let h = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add((i as u64).wrapping_mul(1442695040888963407));
    (h >> 11) as f64 / (1u64 << 53) as f64
}

/// `n` particles on a simple cubic lattice of `spacing`, each displaced
/// by up to a quarter spacing per axis.
///
/// The first layer sits at `z = spacing`, so the same placement works
/// above a wall.
pub fn lattice_positions(n: usize, spacing: f64, seed: u64) -> Vec<f64> {
    let side = lattice_side(n);
    let mut out = Vec::with_capacity(3 * n);
    for i in 0..n {
        let site = [i % side, (i / side) % side, i / (side * side)];
        for (axis, &s) in site.iter().enumerate() {
            let jitter = (unit_hash(seed, 3 * i + axis) - 0.5) * 0.5 * spacing;
            let offset = if axis == 2 { spacing } else { 0.0 };
            out.push(offset + s as f64 * spacing + jitter);
        }
    }
    out
}

/// Deterministic forces in `[-1, 1)`.
pub fn bench_forces(n: usize, seed: u64) -> Vec<f64> {
    (0..3 * n)
        .map(|i| unit_hash(seed ^ 0x5eed, i) * 2.0 - 1.0)
        .collect()
}

fn build<T: Scalar>(
    kind: SolverKind,
    periodicity: Periodicity,
    n: usize,
    seed: u64,
    box_edge: Option<f64>,
) -> Result<Solver<T>, MobilityError> {
    let mut solver = Solver::<T>::new(kind, periodicity)?;
    if let Some(l) = box_edge {
        solver.set_parameters(SpectralRpyOptions::cubic(l).with_cutoff(PERIODIC_CUTOFF).into())?;
    }
    solver.initialize(Parameters::new(1.0, 1.0, 1.0, n).with_seed(seed))?;
    solver.set_positions(&lattice_positions(n, SPACING, seed))?;
    Ok(solver)
}

/// All-pairs RPY, free space, `n` particles.
pub fn open_profile<T: Scalar>(n: usize, seed: u64) -> Result<Solver<T>, MobilityError> {
    build(SolverKind::NBody, Periodicity::open(), n, seed, None)
}

/// All-pairs RPY above a wall, `n` particles.
pub fn wall_profile<T: Scalar>(n: usize, seed: u64) -> Result<Solver<T>, MobilityError> {
    build(SolverKind::NBody, Periodicity::bottom_wall(), n, seed, None)
}

/// Spectral RPY in a cubic box sized to the lattice, `n` particles.
pub fn periodic_profile<T: Scalar>(n: usize, seed: u64) -> Result<Solver<T>, MobilityError> {
    let edge = lattice_side(n) as f64 * SPACING;
    build(
        SolverKind::SpectralRpy,
        Periodicity::triply_periodic(),
        n,
        seed,
        Some(edge),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_side_covers_n() {
        assert_eq!(lattice_side(1), 1);
        assert_eq!(lattice_side(8), 2);
        assert_eq!(lattice_side(9), 3);
        assert_eq!(lattice_side(1000), 10);
    }

    #[test]
    fn lattice_positions_keep_particles_apart() {
        let p = lattice_positions(27, SPACING, 42);
        assert_eq!(p.len(), 81);
        for (i, a) in p.chunks_exact(3).enumerate() {
            assert!(a[2] >= 0.75 * SPACING);
            for b in p.chunks_exact(3).skip(i + 1) {
                let d: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                assert!(d.sqrt() >= 0.5 * SPACING - 1e-12);
            }
        }
    }

    #[test]
    fn lattice_positions_deterministic() {
        assert_eq!(lattice_positions(10, 2.0, 7), lattice_positions(10, 2.0, 7));
        assert_ne!(lattice_positions(10, 2.0, 7), lattice_positions(10, 2.0, 8));
    }

    #[test]
    fn forces_are_bounded() {
        let f = bench_forces(64, 3);
        assert_eq!(f.len(), 192);
        assert!(f.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn profiles_build() {
        for mut solver in [
            open_profile::<f64>(8, 1).unwrap(),
            wall_profile::<f64>(8, 1).unwrap(),
            periodic_profile::<f64>(8, 1).unwrap(),
        ] {
            let out = solver.mdot(&bench_forces(8, 1), false).unwrap();
            assert!(out.velocities.iter().all(|v| v.is_finite()));
        }
    }
}
