//! Core types for the Stokes mobility framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by every solver backend: the
//! precision policy, periodicity descriptors, lifecycle state, error
//! types, validated parameters, and the particle position buffer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod options;
pub mod params;
pub mod periodicity;
pub mod positions;
pub mod scalar;
pub mod state;

pub use error::{ConfigError, MobilityError};
pub use options::{OptionKind, OptionSpec, OptionValue, SolverOptions};
pub use params::{Parameters, DEFAULT_TOLERANCE};
pub use periodicity::{Periodicity, PeriodicityMode, PeriodicitySet};
pub use positions::{coerce, coerce_into, PositionBuffer};
pub use scalar::{Precision, Scalar};
pub use state::SolverState;
