//! Per-solver evaluation metrics.
//!
//! [`SolverMetrics`] is updated by every evaluation and read through
//! `Mobility::metrics`, for profiling and for spotting square-root
//! samplers that stop converging.

use crate::lanczos::LanczosReport;

/// Counters and timings collected by one solver instance.
///
/// Durations are in microseconds and describe the most recent call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverMetrics {
    /// Deterministic `M·F` evaluations since the last `initialize`.
    pub mdot_calls: u64,
    /// Fluctuation samples drawn since the last `initialize`.
    pub fluctuation_calls: u64,
    /// Wall-clock time of the last deterministic evaluation.
    pub last_mdot_us: u64,
    /// Wall-clock time of the last fluctuation sample.
    pub last_fluctuation_us: u64,
    /// Operator applications in the last Lanczos run, 0 if none ran.
    pub lanczos_iterations: usize,
    /// Whether the last Lanczos run met its tolerance.
    pub lanczos_converged: bool,
}

impl SolverMetrics {
    /// Fold in the outcome of a Lanczos run.
    pub fn record_lanczos(&mut self, report: LanczosReport) {
        self.lanczos_iterations = report.iterations;
        self.lanczos_converged = report.converged;
    }
}
