//! Stokes: hydrodynamic mobility for Brownian and Stokesian dynamics.
//!
//! This is the facade crate that re-exports the public API of the stokes
//! sub-crates. A solver maps forces on `N` spheres in a viscous fluid to
//! their velocities, `u = M F`, and samples the thermal displacement
//! `sqrt(2 k_B T M) dW` whose covariance balances that mobility.
//!
//! # Quick start
//!
//! ```rust
//! use stokes::prelude::*;
//!
//! // Two spheres in unbounded fluid, solved in single precision.
//! let mut solver = Solver::<f32>::auto(Periodicity::open())?;
//! solver.initialize(Parameters::new(1.0, 1.0, 1.0, 2).with_seed(7))?;
//!
//! // Inputs of either width are accepted and cast once.
//! solver.set_positions(&[0.0f64, 0.0, 0.0, 3.0, 0.0, 0.0])?;
//! let out = solver.mdot(&[1.0f64, 0.0, 0.0, 0.0, 0.0, 0.0], true)?;
//!
//! assert_eq!(solver.precision(), Precision::Narrow);
//! assert!(out.velocities[0] > out.velocities[3]);
//! assert!(out.fluctuation.iter().all(|v| v.is_finite()));
//! # Ok::<(), MobilityError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stokes-core` | precision, periodicity, parameters, options, errors |
//! | [`solver`] | `stokes-solver` | the `Mobility` contract, `Backend` trait, Lanczos sampler |
//! | [`solvers`] | `stokes-solvers` | shipped backends and the registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Precision, periodicity, parameters and errors (`stokes-core`).
pub use stokes_core as types;

/// The mobility contract and its generic implementation (`stokes-solver`).
///
/// Implement [`solver::Backend`] to add an algorithm; wrap it in
/// [`solver::MobilitySolver`] to get the full lifecycle.
pub use stokes_solver as solver;

/// Shipped backends and run-time selection (`stokes-solvers`).
///
/// [`solvers::SelfMobility`], [`solvers::NBody`], [`solvers::SpectralRpy`]
/// and [`solvers::DoublyPeriodicRpy`], plus the [`solvers::Solver`] enum.
pub use stokes_solvers as solvers;

/// Common imports for typical usage.
///
/// ```rust
/// use stokes::prelude::*;
/// ```
pub mod prelude {
    // Configuration
    pub use stokes_core::{
        OptionValue, Parameters, Periodicity, PeriodicityMode, Precision, Scalar, SolverOptions,
        SolverState,
    };

    // Errors
    pub use stokes_core::{ConfigError, MobilityError};

    // Contract
    pub use stokes_solver::{Displacements, MdotOutput, Mobility, MobilitySolver, SolverMetrics};

    // Backends
    pub use stokes_solvers::{
        DoublyPeriodicRpy, DoublyPeriodicRpyOptions, NBody, NBodyOptions, SelfMobility,
        SelfMobilityOptions, Solver, SolverKind, SolverParameters, SpectralRpy,
        SpectralRpyOptions,
    };
}
