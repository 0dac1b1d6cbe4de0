//! Contract checks shared by every backend.
//!
//! Each check receives a freshly constructed and configured (options set,
//! not yet initialized) solver from a factory closure and panics with a
//! descriptive message on violation. [`run_all`] runs the full set.

use stokes_core::{MobilityError, Parameters, Scalar, SolverState};
use stokes_solver::Mobility;

use crate::fixtures::{random_positions, unit_forces, unit_parameters};

fn finite<T: Scalar>(v: &[T]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// `set_positions` and `mdot` fail before `initialize` and succeed after.
#[track_caller]
pub fn state_ordering<T: Scalar, M: Mobility<T>>(solver: &mut M) {
    let pos = random_positions(1, 1.0, 1);
    assert!(matches!(
        solver.set_positions(&pos),
        Err(MobilityError::State { .. })
    ));
    assert!(matches!(
        solver.mdot(&unit_forces(1), false),
        Err(MobilityError::State { .. })
    ));
    solver
        .initialize(unit_parameters(1))
        .unwrap_or_else(|e| panic!("{}: initialize failed: {e}", solver.name()));
    assert_eq!(solver.state(), SolverState::Ready);
    solver.set_positions(&pos).unwrap();
    solver.mdot(&unit_forces(1), false).unwrap();
}

/// One particle in `[0, 1)³` under unit force moves.
#[track_caller]
pub fn nonzero_response<T: Scalar, M: Mobility<T>>(solver: &mut M, seed: u64) {
    solver.initialize(unit_parameters(1)).unwrap();
    let pos: Vec<T> = random_positions(1, 1.0, seed)
        .into_iter()
        .map(T::from_real)
        .collect();
    let forces: Vec<T> = vec![T::one(); 3];
    solver.set_positions(&pos).unwrap();
    let out = solver.mdot(&forces, false).unwrap();
    assert_eq!(out.velocities.len(), 3);
    assert!(
        out.velocities.iter().any(|v| *v != T::zero()),
        "{}: zero response",
        solver.name()
    );
}

/// Inputs at either width are accepted and give finite results.
#[track_caller]
pub fn mixed_precision<T: Scalar, M: Mobility<T>>(solver: &mut M, seed: u64) {
    solver.initialize(unit_parameters(1)).unwrap();
    let wide = random_positions(1, 1.0, seed);
    let narrow: Vec<f32> = wide.iter().map(|&v| v as f32).collect();
    solver.set_positions(&narrow).unwrap();
    let out = solver.mdot(&unit_forces(1), false).unwrap();
    assert_eq!(out.velocities.len(), 3);
    assert!(finite(&out.velocities));
    solver.set_positions(&wide).unwrap();
    let out = solver.mdot(&[1.0f32; 3], false).unwrap();
    assert_eq!(out.velocities.len(), 3);
    assert!(finite(&out.velocities));
}

/// Identical inputs give bit-identical deterministic output.
#[track_caller]
pub fn determinism<T: Scalar, M: Mobility<T>>(solver: &mut M, params: Parameters, positions: &[f64]) {
    let n = params.number_particles;
    solver.initialize(params).unwrap();
    solver.set_positions(positions).unwrap();
    let forces: Vec<f64> = (0..3 * n).map(|i| (i as f64 * 0.7).sin()).collect();
    let a = solver.mdot(&forces, false).unwrap();
    let b = solver.mdot(&forces, false).unwrap();
    assert_eq!(a, b);
    assert!(a.fluctuation.iter().all(|v| *v == T::zero()));
}

/// Force vectors of the wrong length are shape errors.
#[track_caller]
pub fn shape_invariant<T: Scalar, M: Mobility<T>>(solver: &mut M) {
    solver.initialize(unit_parameters(1)).unwrap();
    for len in [0, 2, 4] {
        let err = solver.mdot(&vec![1.0f64; len], false).unwrap_err();
        assert_eq!(
            err,
            MobilityError::Shape {
                input: "forces",
                expected: 3,
                found: len,
            }
        );
    }
    assert!(matches!(
        solver.set_positions(&[0.0f32; 4]),
        Err(MobilityError::Shape { .. })
    ));
}

/// Successive fluctuating calls draw fresh noise over a fixed drift.
#[track_caller]
pub fn fluctuation_independence<T: Scalar, M: Mobility<T>>(solver: &mut M, seed: u64) {
    solver
        .initialize(unit_parameters(1).with_seed(seed))
        .unwrap();
    solver.set_positions(&random_positions(1, 1.0, seed)).unwrap();
    let forces = unit_forces(1);
    let a = solver.mdot(&forces, true).unwrap();
    let b = solver.mdot(&forces, true).unwrap();
    assert_eq!(a.velocities, b.velocities);
    assert_ne!(a.fluctuation, b.fluctuation);
    assert!(finite(&a.fluctuation) && finite(&b.fluctuation));
    assert_eq!(solver.metrics().fluctuation_calls, 2);
}

/// Run every check, each on a fresh solver from `make`.
pub fn run_all<T: Scalar, M: Mobility<T>>(mut make: impl FnMut() -> M, seed: u64) {
    state_ordering(&mut make());
    nonzero_response(&mut make(), seed);
    mixed_precision(&mut make(), seed);
    determinism(
        &mut make(),
        unit_parameters(4),
        &random_positions(4, 3.0, seed),
    );
    shape_invariant(&mut make());
    fluctuation_independence(&mut make(), seed);
}
