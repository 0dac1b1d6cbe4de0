//! Context passed to backends when sampling thermal fluctuations.
//!
//! [`FluctuationContext`] lends a backend the solver's random stream,
//! its Krylov workspace and the configured tolerance for the duration of
//! one `sqrt_mdot_w` call.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use stokes_core::Scalar;

use crate::krylov::KrylovWorkspace;
use crate::lanczos::LanczosReport;

/// Borrowed sampling state for one fluctuation draw.
pub struct FluctuationContext<'a, T> {
    rng: &'a mut ChaCha8Rng,
    workspace: &'a mut KrylovWorkspace<T>,
    tolerance: f64,
    report: Option<LanczosReport>,
}

impl<'a, T: Scalar> FluctuationContext<'a, T> {
    /// Construct a context.
    ///
    /// Typically called by the solver, not by backends directly.
    pub fn new(
        rng: &'a mut ChaCha8Rng,
        workspace: &'a mut KrylovWorkspace<T>,
        tolerance: f64,
    ) -> Self {
        Self {
            rng,
            workspace,
            tolerance,
            report: None,
        }
    }

    /// One standard normal variate (Box-Muller).
    pub fn normal(&mut self) -> f64 {
        let u1: f64 = self.rng.random::<f64>().max(1e-300);
        let u2: f64 = self.rng.random();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Fill `out` with independent standard normal variates.
    pub fn fill_normal(&mut self, out: &mut [T]) {
        for o in out.iter_mut() {
            *o = T::from_real(self.normal());
        }
    }

    /// Relative tolerance for iterative samplers.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Krylov workspace owned by the solver.
    pub fn workspace(&mut self) -> &mut KrylovWorkspace<T> {
        self.workspace
    }

    /// Record the outcome of an iterative sampler run.
    pub fn record(&mut self, report: LanczosReport) {
        self.report = Some(report);
    }

    /// Outcome of the last iterative run in this context, if any.
    pub fn report(&self) -> Option<LanczosReport> {
        self.report
    }
}
