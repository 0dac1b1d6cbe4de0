//! Mobility backends for the stokes workspace.
//!
//! | Backend | Periodicity | Square root |
//! |---------|-------------|-------------|
//! | [`SelfMobility`] | `(open, open, open)` | exact, diagonal |
//! | [`NBody`] | `(open, open, open)`, `(open, open, single_wall)` | Lanczos |
//! | [`SpectralRpy`] | `(periodic, periodic, periodic)` | exact, per mode |
//! | [`DoublyPeriodicRpy`] | `(periodic, periodic, open)`, `(periodic, periodic, single_wall)` | Lanczos |
//!
//! Each backend plugs into [`stokes_solver::MobilitySolver`]; [`Solver`]
//! picks one at run time by name or by geometry.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod doubly_periodic;
pub mod nbody;
pub mod registry;
pub mod rpy;
pub mod self_mobility;
pub mod special;
pub mod spectral;

pub use doubly_periodic::{Confinement, DoublyPeriodicRpy, DoublyPeriodicRpyOptions};
pub use nbody::{Kernel, NBody, NBodyOptions};
pub use registry::{registry, routes, select, Solver, SolverKind, SolverParameters};
pub use self_mobility::{SelfMobility, SelfMobilityOptions};
pub use spectral::{SpectralRpy, SpectralRpyOptions, CUTOFF_RANGE, DEFAULT_CUTOFF, MAX_MODES};
