//! Mobility contract and backend plumbing for Stokes solvers.
//!
//! The [`Backend`] trait is what a geometry-specific algorithm
//! implements: a deterministic `M·F` kernel and, optionally, an exact
//! `sqrt(M)·z` sampler. [`MobilitySolver`] wraps any backend in the
//! shared lifecycle (configure, initialize, set positions, evaluate),
//! performs precision coercion at every entry point and composes the
//! deterministic and fluctuating terms. Backends without an exact
//! square root fall back to the Krylov sampler in [`lanczos`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod context;
pub mod krylov;
pub mod lanczos;
pub mod linalg;
pub mod metrics;
pub mod solver;

pub use backend::{check_geometry, Backend};
pub use context::FluctuationContext;
pub use krylov::KrylovWorkspace;
pub use lanczos::{LanczosReport, MAX_ITERATIONS};
pub use metrics::SolverMetrics;
pub use solver::{Displacements, MdotOutput, Mobility, MobilitySolver};
