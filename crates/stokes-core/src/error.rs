//! Error types for the Stokes mobility framework.
//!
//! [`ConfigError`] covers everything detected while recording or
//! validating configuration. [`MobilityError`] is the error surfaced by
//! every public solver operation and wraps `ConfigError` alongside the
//! state, shape and geometry failures.

use std::error::Error;
use std::fmt;

use crate::options::OptionKind;
use crate::periodicity::Periodicity;
use crate::state::SolverState;

/// Configuration errors, raised by `set_parameters` (unknown option names,
/// wrong value kinds) and by `initialize` (missing or out-of-domain values).
///
/// Recoverable: the caller may fix the configuration and retry.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A required backend option was never set.
    MissingParameter {
        /// Backend that requires the option.
        solver: &'static str,
        /// Option name.
        name: &'static str,
    },
    /// A value lies outside its declared domain.
    OutOfRange {
        /// Parameter or option name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Human-readable description of the valid domain.
        expected: &'static str,
    },
    /// The option name is not declared by this backend.
    UnknownOption {
        /// Backend that rejected the option.
        solver: &'static str,
        /// The unrecognised name.
        name: String,
    },
    /// The option was given a value of the wrong kind.
    OptionKindMismatch {
        /// Option name.
        name: &'static str,
        /// Declared kind.
        expected: OptionKind,
        /// Kind actually supplied.
        found: OptionKind,
    },
    /// Batch sizes do not tile the particle count.
    BatchLayout {
        /// Number of batches.
        n_batch: usize,
        /// Particles per batch.
        n_per_batch: usize,
        /// Configured particle count.
        number_particles: usize,
    },
    /// Torques were requested from a backend without rotational coupling.
    TorqueUnsupported {
        /// Backend name.
        solver: &'static str,
    },
    /// A torque evaluation was requested but `needs_torque` is off.
    TorqueNotConfigured,
    /// The backend cannot be configured again once ready.
    NotReinitializable {
        /// Backend name.
        solver: &'static str,
    },
    /// No registered backend has this name.
    UnknownSolver {
        /// The unrecognised name.
        name: String,
    },
    /// Options built for one backend were handed to another.
    SolverMismatch {
        /// Backend the options were built for.
        expected: &'static str,
        /// Backend of the solver instance.
        found: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParameter { solver, name } => {
                write!(f, "{solver}: required option '{name}' was not set")
            }
            Self::OutOfRange {
                name,
                value,
                expected,
            } => write!(f, "{name} = {value} is out of range, expected {expected}"),
            Self::UnknownOption { solver, name } => {
                write!(f, "{solver} does not accept option '{name}'")
            }
            Self::OptionKindMismatch {
                name,
                expected,
                found,
            } => write!(f, "option '{name}' expects a {expected} value, got {found}"),
            Self::BatchLayout {
                n_batch,
                n_per_batch,
                number_particles,
            } => write!(
                f,
                "{n_batch} batches of {n_per_batch} particles do not match {number_particles} particles"
            ),
            Self::TorqueUnsupported { solver } => {
                write!(f, "{solver} does not support torques")
            }
            Self::TorqueNotConfigured => {
                write!(f, "torques supplied but the solver was initialized without needs_torque")
            }
            Self::NotReinitializable { solver } => {
                write!(f, "{solver} cannot be reconfigured once initialized")
            }
            Self::UnknownSolver { name } => write!(f, "no solver named '{name}'"),
            Self::SolverMismatch { expected, found } => {
                write!(f, "options for {expected} given to a {found} solver")
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors surfaced synchronously by solver operations.
///
/// Precision mismatches are never an error: inputs are coerced.
#[derive(Clone, Debug, PartialEq)]
pub enum MobilityError {
    /// Missing, mistyped or out-of-domain configuration. Recoverable.
    Config(ConfigError),
    /// The operation is not valid in the current lifecycle state.
    /// Recoverable by completing initialization first.
    State {
        /// The rejected operation.
        operation: &'static str,
        /// State at the time of the call.
        state: SolverState,
    },
    /// An input vector has the wrong length. Never truncated or padded.
    Shape {
        /// Which input was mis-sized.
        input: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        found: usize,
    },
    /// The backend cannot represent the requested geometry. Terminal for
    /// the instance.
    UnsupportedGeometry {
        /// Backend name.
        solver: &'static str,
        /// The rejected descriptor.
        periodicity: Periodicity,
    },
    /// A periodicity name did not parse.
    InvalidPeriodicity {
        /// The unparseable name.
        value: String,
    },
}

impl MobilityError {
    /// `true` if retrying with corrected input or configuration can succeed
    /// on the same instance.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedGeometry { .. } | Self::InvalidPeriodicity { .. }
        )
    }
}

impl fmt::Display for MobilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::State { operation, state } => {
                write!(f, "{operation} is not allowed while the solver is {state}")
            }
            Self::Shape {
                input,
                expected,
                found,
            } => write!(f, "{input} has length {found}, expected {expected}"),
            Self::UnsupportedGeometry {
                solver,
                periodicity,
            } => write!(f, "{solver} does not support periodicity {periodicity}"),
            Self::InvalidPeriodicity { value } => {
                write!(f, "invalid periodicity '{value}'")
            }
        }
    }
}

impl Error for MobilityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for MobilityError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_is_source() {
        let err = MobilityError::from(ConfigError::TorqueUnsupported { solver: "NBody" });
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "configuration: NBody does not support torques"
        );
    }

    #[test]
    fn geometry_errors_are_terminal() {
        let err = MobilityError::UnsupportedGeometry {
            solver: "SelfMobility",
            periodicity: Periodicity::triply_periodic(),
        };
        assert!(!err.is_recoverable());
        assert!(MobilityError::State {
            operation: "mdot",
            state: SolverState::Configured,
        }
        .is_recoverable());
    }

    #[test]
    fn shape_message_names_lengths() {
        let err = MobilityError::Shape {
            input: "forces",
            expected: 3,
            found: 4,
        };
        assert_eq!(err.to_string(), "forces has length 4, expected 3");
    }
}
