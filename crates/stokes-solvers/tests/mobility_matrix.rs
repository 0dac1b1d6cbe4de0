//! Dense mobility matrices assembled from `mdot`, checked against known
//! physics.

use std::f64::consts::PI;

use stokes_core::{Parameters, Periodicity, Scalar};
use stokes_solver::Mobility;
use stokes_solvers::{
    DoublyPeriodicRpyOptions, NBodyOptions, SelfMobilityOptions, Solver, SolverParameters,
    SpectralRpyOptions,
};
use stokes_test_utils::fixtures::{lift, random_positions, separated_positions};
use stokes_test_utils::{assert_symmetric, max_abs, mobility_matrix};

const MU0: f64 = 1.0 / (6.0 * PI);

fn ready<T: Scalar>(
    periodicity: Periodicity,
    options: impl Into<SolverParameters>,
    positions: &[f64],
) -> Solver<T> {
    let mut s = Solver::<T>::auto(periodicity).unwrap();
    let options = options.into();
    if options.kind() != s.kind() {
        s = Solver::new(options.kind(), periodicity).unwrap();
    }
    s.set_parameters(options).unwrap();
    s.initialize(Parameters::new(1.0, 1.0, 1.0, positions.len() / 3))
        .unwrap();
    s.set_positions(positions).unwrap();
    s
}

fn cases() -> Vec<(Periodicity, SolverParameters, f64)> {
    vec![
        (Periodicity::open(), SelfMobilityOptions.into(), 0.0),
        (Periodicity::open(), NBodyOptions::default().into(), 0.0),
        (Periodicity::bottom_wall(), NBodyOptions::default().into(), 1.0),
        (
            Periodicity::triply_periodic(),
            SpectralRpyOptions::cubic(10.0).with_cutoff(4.0).into(),
            0.0,
        ),
        (
            Periodicity::triply_periodic(),
            SpectralRpyOptions::cubic(10.0)
                .with_shear_strain(0.3)
                .with_cutoff(4.0)
                .into(),
            0.0,
        ),
        (
            Periodicity::doubly_periodic(),
            DoublyPeriodicRpyOptions::square(6.0)
                .with_heights(0.0, 6.0)
                .with_cutoff(4.0)
                .into(),
            0.0,
        ),
        (
            Periodicity::doubly_periodic_wall(),
            DoublyPeriodicRpyOptions::square(6.0).into(),
            1.0,
        ),
    ]
}

#[test]
fn matrices_are_symmetric_in_wide_precision() {
    for (periodicity, options, height) in cases() {
        for n in [1, 2, 3, 10] {
            let mut pos = random_positions(n, 6.0, n as u64);
            lift(&mut pos, height);
            let mut s = ready::<f64>(periodicity, options.clone(), &pos);
            let m = mobility_matrix(&mut s).unwrap();
            assert!(max_abs(&m) > 0.0);
            assert_symmetric(&m, 3 * n, 1e-10);
        }
    }
}

#[test]
fn matrices_are_symmetric_in_narrow_precision() {
    for (periodicity, options, height) in cases() {
        let mut pos = random_positions(3, 6.0, 17);
        lift(&mut pos, height);
        let mut s = ready::<f32>(periodicity, options, &pos);
        let m = mobility_matrix(&mut s).unwrap();
        assert_symmetric(&m, 9, 1e-4);
    }
}

#[test]
fn single_particle_is_stokes_drag() {
    for options in [
        SolverParameters::from(SelfMobilityOptions),
        NBodyOptions::default().into(),
    ] {
        let mut s = ready::<f64>(Periodicity::open(), options, &[0.4, 0.1, 0.7]);
        let m = mobility_matrix(&mut s).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { MU0 } else { 0.0 };
                assert!((m[i * 3 + j] - expected).abs() < 1e-14);
            }
        }
    }
}

#[test]
fn periodic_self_mobility_follows_hasimoto() {
    let l = 16.0;
    let mut s = ready::<f64>(
        Periodicity::triply_periodic(),
        SpectralRpyOptions::cubic(l),
        &[1.0, 2.0, 3.0],
    );
    let m = mobility_matrix(&mut s).unwrap();
    let ratio = 1.0 / l;
    let expected = MU0 * (1.0 - 2.837297 * ratio + 4.0 * PI / 3.0 * ratio.powi(3));
    for d in 0..3 {
        let got = m[d * 3 + d];
        assert!(
            ((got - expected) / expected).abs() < 0.02,
            "axis {d}: {got} vs {expected}"
        );
    }
    assert!(m[1].abs() < 1e-3 * MU0);
}

#[test]
fn narrow_periodic_self_mobility_follows_hasimoto() {
    // About a million modes: the per-mode sums must not round at the
    // solver width.
    let l = 64.0;
    let options = SpectralRpyOptions::cubic(l);
    let mut narrow = ready::<f32>(Periodicity::triply_periodic(), options.clone(), &[1.0, 2.0, 3.0]);
    let mut wide = ready::<f64>(Periodicity::triply_periodic(), options, &[1.0, 2.0, 3.0]);
    let m = mobility_matrix(&mut narrow).unwrap();
    let reference = mobility_matrix(&mut wide).unwrap();
    let ratio = 1.0 / l;
    let expected = MU0 * (1.0 - 2.837297 * ratio + 4.0 * PI / 3.0 * ratio.powi(3));
    for d in 0..3 {
        let got = m[d * 3 + d];
        assert!(
            ((got - expected) / expected).abs() < 0.02,
            "axis {d}: {got} vs {expected}"
        );
        let exact = reference[d * 3 + d];
        assert!(((got - exact) / exact).abs() < 1e-5, "axis {d}: {got} vs {exact}");
    }
}

#[test]
fn doubly_periodic_wall_is_stiffer_than_open_plane() {
    // Pushing a whole sheet of images along the wall drives a Couette
    // flow that the single wall never sees.
    let h = 2.0;
    let mut single = ready::<f64>(Periodicity::bottom_wall(), NBodyOptions::default(), &[0.0, 0.0, h]);
    let mut sheet = ready::<f64>(
        Periodicity::doubly_periodic_wall(),
        DoublyPeriodicRpyOptions::square(8.0),
        &[0.0, 0.0, h],
    );
    let a = mobility_matrix(&mut single).unwrap();
    let b = mobility_matrix(&mut sheet).unwrap();
    assert!(b[0] > a[0]);
    assert!((b[0] - b[4]).abs() < 1e-12 * b[0]);
    assert!(b[8] > 0.0 && b[8] < MU0);
    assert!(b[1].abs() < 1e-12 * b[0] && b[2].abs() < 1e-12 * b[0]);
}

#[test]
fn wall_self_mobility_follows_swan_brady() {
    for h in [1.5f64, 2.5, 6.0] {
        let mut s = ready::<f64>(
            Periodicity::bottom_wall(),
            NBodyOptions::default(),
            &[0.0, 0.0, h],
        );
        let m = mobility_matrix(&mut s).unwrap();
        let parallel = 1.0 - 9.0 / (16.0 * h) + 1.0 / (8.0 * h.powi(3)) - 1.0 / (16.0 * h.powi(5));
        let perpendicular = 1.0 - 9.0 / (8.0 * h) + 1.0 / (2.0 * h.powi(3)) - 1.0 / (8.0 * h.powi(5));
        assert!((m[0] / MU0 - parallel).abs() < 1e-12);
        assert!((m[4] / MU0 - parallel).abs() < 1e-12);
        assert!((m[8] / MU0 - perpendicular).abs() < 1e-12);
    }
}

#[test]
fn wall_effect_fades_with_height() {
    let pos = separated_positions(3, 4.0, 2.5, 5);
    let mut free = ready::<f64>(Periodicity::open(), NBodyOptions::default(), &pos);
    let mut high = pos.clone();
    lift(&mut high, 1.0e6);
    let mut walled = ready::<f64>(Periodicity::bottom_wall(), NBodyOptions::default(), &high);
    let a = mobility_matrix(&mut free).unwrap();
    let b = mobility_matrix(&mut walled).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() < 1e-5 * MU0);
    }
}

#[test]
fn open_matrix_is_positive_definite() {
    // Overlapping and touching pairs included.
    let pos = random_positions(6, 2.0, 3);
    let mut s = ready::<f64>(Periodicity::open(), NBodyOptions::default(), &pos);
    let m = mobility_matrix(&mut s).unwrap();
    let dim = 18;
    let trial = random_positions(6, 2.0, 99);
    for shift in 0..4 {
        let x: Vec<f64> = trial.iter().map(|v| v - 1.0 + 0.1 * shift as f64).collect();
        let mut q = 0.0;
        for i in 0..dim {
            for j in 0..dim {
                q += x[i] * m[i * dim + j] * x[j];
            }
        }
        assert!(q > 0.0);
    }
}
