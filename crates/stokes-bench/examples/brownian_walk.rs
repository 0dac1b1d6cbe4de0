//! Brownian dynamics of a small cluster above a wall.
//!
//! Demonstrates: build a profile → loop { M·F + sqrt(2 kT M) dW } →
//! Euler-Maruyama update → read solver metrics.

use stokes_bench::wall_profile;
use stokes_solver::Mobility;

fn main() {
    println!("=== Stokes Brownian Walk Example ===\n");

    let n = 8;
    let dt: f64 = 0.01;
    let mut solver = wall_profile::<f64>(n, 42).unwrap();
    let mut positions = solver.positions().to_vec();

    // Gravity pulls every particle toward the wall.
    let mut forces = vec![0.0; 3 * n];
    for f in forces.chunks_exact_mut(3) {
        f[2] = -1.0;
    }

    for step in 0..200 {
        let drift = solver.mdot(&forces, false).unwrap().velocities;
        let noise = solver.sqrt_mdot_w(dt.sqrt()).unwrap().linear;
        for ((p, u), w) in positions.iter_mut().zip(&drift).zip(&noise) {
            *p += u * dt + w;
        }
        solver.set_positions(&positions).unwrap();

        if step % 50 == 0 {
            let mean_height: f64 =
                positions.chunks_exact(3).map(|p| p[2]).sum::<f64>() / n as f64;
            println!("step {step:>3}: mean height {mean_height:.3}");
        }
    }

    let m = solver.metrics();
    println!(
        "\n{} mdot calls, {} fluctuation draws, last Lanczos: {} iterations (converged = {})",
        m.mdot_calls, m.fluctuation_calls, m.lanczos_iterations, m.lanczos_converged
    );
}
