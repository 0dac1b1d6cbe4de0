//! Criterion micro-benchmarks for fluctuation sampling.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use stokes_bench::{open_profile, periodic_profile};
use stokes_solver::Mobility;

/// Benchmark: Lanczos square root on the all-pairs operator.
fn bench_lanczos_noise(c: &mut Criterion) {
    let mut solver = open_profile::<f64>(256, 4).unwrap();
    c.bench_function("lanczos_noise_256", |b| {
        b.iter(|| black_box(solver.sqrt_mdot_w(1.0).unwrap()));
    });
    let m = solver.metrics();
    println!(
        "lanczos: {} iterations, converged = {}",
        m.lanczos_iterations, m.lanczos_converged
    );
}

/// Benchmark: exact per-mode sampling in a periodic box.
fn bench_spectral_noise(c: &mut Criterion) {
    let mut solver = periodic_profile::<f64>(64, 5).unwrap();
    c.bench_function("spectral_noise_64", |b| {
        b.iter(|| black_box(solver.sqrt_mdot_w(1.0).unwrap()));
    });
}

criterion_group!(benches, bench_lanczos_noise, bench_spectral_noise);
criterion_main!(benches);
