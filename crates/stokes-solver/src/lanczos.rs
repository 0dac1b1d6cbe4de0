//! Krylov approximation of `sqrt(M)·z` for a symmetric positive
//! semi-definite operator `M` that is only available as a product.
//!
//! Builds an orthonormal Lanczos basis `V_m` with full
//! re-orthogonalization and returns `|z| V_m sqrt(T_m) e_1`, where `T_m`
//! is the projected tridiagonal matrix. Iteration stops when the relative
//! change between successive estimates drops below the tolerance, on
//! breakdown (the Krylov space is invariant), or when the basis spans the
//! whole space. The cap is `min(dim, MAX_ITERATIONS)`; hitting it is
//! logged, not reported as an error.

use log::{trace, warn};
use stokes_core::Scalar;

use crate::context::FluctuationContext;
use crate::linalg::sqrt_tridiagonal_e1;

/// Upper bound on Lanczos iterations per sample.
pub const MAX_ITERATIONS: usize = 150;

/// Residual size, in units of the solver's machine epsilon relative to
/// the Rayleigh quotient, below which the Krylov space is invariant.
const BREAKDOWN_ULPS: f64 = 16.0;

/// Outcome of one Lanczos run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LanczosReport {
    /// Operator applications performed.
    pub iterations: usize,
    /// `false` if the iteration cap was reached before convergence.
    pub converged: bool,
}

/// Write `sqrt(M)·z` into `out` for a fresh standard normal `z` of length
/// `out.len()` drawn from `ctx`.
///
/// `apply(v, mv)` must write `M v` into `mv` (which arrives zeroed).
pub fn sqrt_mdot_noise<T, F>(
    ctx: &mut FluctuationContext<'_, T>,
    out: &mut [T],
    mut apply: F,
) -> LanczosReport
where
    T: Scalar,
    F: FnMut(&[T], &mut [T]),
{
    let dim = out.len();
    let z: Vec<f64> = (0..dim).map(|_| ctx.normal()).collect();
    let z_norm = z.iter().map(|x| x * x).sum::<f64>().sqrt();
    if dim == 0 || z_norm == 0.0 {
        out.fill(T::zero());
        let report = LanczosReport {
            iterations: 0,
            converged: true,
        };
        ctx.record(report);
        return report;
    }

    let tolerance = ctx.tolerance();
    let breakdown = BREAKDOWN_ULPS * T::EPS.to_real();
    let cap = dim.min(MAX_ITERATIONS);
    let ws = ctx.workspace();
    ws.reset(dim);
    ws.push_scaled(&z, 1.0 / z_norm);

    let mut alpha = Vec::with_capacity(cap);
    let mut beta = Vec::with_capacity(cap);
    let mut previous: Vec<f64> = Vec::new();
    let mut coeffs = Vec::new();
    let mut report = LanczosReport {
        iterations: 0,
        converged: false,
    };

    for m in 1..=cap {
        report.iterations = m;
        let a = ws.apply_last(&mut apply);
        alpha.push(a);
        coeffs = sqrt_tridiagonal_e1(&alpha, &beta);

        if m > 1 && relative_change(&coeffs, &previous) <= tolerance {
            report.converged = true;
            break;
        }

        let b = ws.orthogonalize();
        if m == dim || b <= breakdown * a.abs().max(f64::MIN_POSITIVE) {
            report.converged = true;
            break;
        }
        if m == cap {
            break;
        }
        beta.push(b);
        ws.push_residual(b);
        previous = std::mem::take(&mut coeffs);
    }

    ws.combine(&coeffs, z_norm, out);

    if report.converged {
        trace!("lanczos converged in {} iterations", report.iterations);
    } else {
        warn!(
            "lanczos hit the iteration cap ({}) before reaching tolerance {tolerance:e}",
            report.iterations
        );
    }
    ctx.record(report);
    report
}

/// `|c - [p; 0]| / |c|`, with `p` zero-padded to the length of `c`.
fn relative_change(current: &[f64], previous: &[f64]) -> f64 {
    let mut diff = 0.0;
    let mut norm = 0.0;
    for (i, &c) in current.iter().enumerate() {
        let p = previous.get(i).copied().unwrap_or(0.0);
        diff += (c - p) * (c - p);
        norm += c * c;
    }
    if norm == 0.0 {
        0.0
    } else {
        (diff / norm).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krylov::KrylovWorkspace;
    use crate::linalg::SymmetricEigen;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// SPD test matrix `B Bᵀ + I` with a deterministic `B`.
    fn spd(n: usize) -> Vec<f64> {
        let b: Vec<f64> = (0..n * n)
            .map(|k| ((k * 7 + 3) % 11) as f64 / 11.0 - 0.5)
            .collect();
        let mut a = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                a[i * n + j] = (0..n).map(|k| b[i * n + k] * b[j * n + k]).sum::<f64>();
            }
            a[i * n + i] += 1.0;
        }
        a
    }

    fn matvec(a: &[f64], x: &[f64], out: &mut [f64]) {
        let n = x.len();
        for i in 0..n {
            out[i] = (0..n).map(|j| a[i * n + j] * x[j]).sum();
        }
    }

    /// Draw the same `z` a seeded context would draw.
    fn reference_noise(seed: u64, n: usize) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ws = KrylovWorkspace::<f64>::new();
        let mut ctx = FluctuationContext::new(&mut rng, &mut ws, 1e-4);
        (0..n).map(|_| ctx.normal()).collect()
    }

    #[test]
    fn matches_dense_square_root() {
        let n = 24;
        let a = spd(n);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ws = KrylovWorkspace::<f64>::new();
        let mut ctx = FluctuationContext::new(&mut rng, &mut ws, 1e-10);
        let mut out = vec![0.0; n];
        let report = sqrt_mdot_noise(&mut ctx, &mut out, |v, mv| matvec(&a, v, mv));
        assert!(report.converged);
        assert!(report.iterations <= n);

        let z = reference_noise(5, n);
        let exact = SymmetricEigen::new(a, n).sqrt_apply(&z);
        let err: f64 = out
            .iter()
            .zip(&exact)
            .map(|(u, v)| (u - v).powi(2))
            .sum::<f64>()
            .sqrt();
        let scale: f64 = exact.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!(err / scale < 1e-6, "relative error {}", err / scale);
    }

    #[test]
    fn multiple_of_identity_breaks_down_immediately() {
        let n = 9;
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut ws = KrylovWorkspace::<f32>::new();
        let mut ctx = FluctuationContext::new(&mut rng, &mut ws, 1e-4);
        let mut out = vec![0.0f32; n];
        let report = sqrt_mdot_noise(&mut ctx, &mut out, |v: &[f32], mv: &mut [f32]| {
            for (o, x) in mv.iter_mut().zip(v) {
                *o = 4.0 * x;
            }
        });
        assert_eq!(report.iterations, 1);
        assert!(report.converged);
        assert_eq!(ctx.report(), Some(report));

        let z = reference_noise(8, n);
        for (o, zi) in out.iter().zip(&z) {
            assert!((f64::from(*o) - 2.0 * zi).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_operator_gives_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ws = KrylovWorkspace::<f64>::new();
        let mut ctx = FluctuationContext::new(&mut rng, &mut ws, 1e-4);
        let mut out = vec![1.0; 6];
        let report = sqrt_mdot_noise(&mut ctx, &mut out, |_, _| {});
        assert!(report.converged);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_vector() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ws = KrylovWorkspace::<f64>::new();
        let mut ctx = FluctuationContext::new(&mut rng, &mut ws, 1e-4);
        let report = sqrt_mdot_noise(&mut ctx, &mut [], |_, _| {});
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn relative_change_pads_previous() {
        assert!((relative_change(&[3.0, 4.0], &[3.0]) - 0.8).abs() < 1e-15);
        assert_eq!(relative_change(&[0.0], &[]), 0.0);
    }

    /// `B Bᵀ / n + shift · I` with `B` uniform in `[-1, 1)`.
    fn random_spd(n: usize, seed: u64, shift: f64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let b: Vec<f64> = (0..n * n).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect();
        let mut a = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                a[i * n + j] = (0..n).map(|k| b[i * n + k] * b[j * n + k]).sum::<f64>() / n as f64;
            }
            a[i * n + i] += shift;
        }
        a
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn krylov_noise_tracks_dense_square_root(
            n in 1usize..12,
            seed in 0u64..10_000,
            shift in 0.1f64..2.0,
        ) {
            let a = random_spd(n, seed, shift);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ws = KrylovWorkspace::<f64>::new();
            let mut ctx = FluctuationContext::new(&mut rng, &mut ws, 1e-10);
            let mut out = vec![0.0; n];
            let report = sqrt_mdot_noise(&mut ctx, &mut out, |v, mv| matvec(&a, v, mv));
            prop_assert!(report.converged);
            prop_assert!(report.iterations <= n);

            let z = reference_noise(seed, n);
            let exact = SymmetricEigen::new(a, n).sqrt_apply(&z);
            let err = out
                .iter()
                .zip(&exact)
                .map(|(u, v)| (u - v).powi(2))
                .sum::<f64>()
                .sqrt();
            let scale = exact.iter().map(|v| v * v).sum::<f64>().sqrt();
            prop_assert!(err <= 1e-6 * scale, "n = {}: relative error {}", n, err / scale);
        }
    }
}
