//! Solver lifecycle state.

use std::fmt;

/// Lifecycle state of a solver instance.
///
/// ```text
/// Uninitialized --set_parameters--> Configured --initialize--> Ready
///        \_____________________initialize_____________________/
/// ```
///
/// A failed `initialize` always leaves the solver in `Configured`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolverState {
    /// Constructed, nothing configured yet.
    Uninitialized,
    /// Options recorded; not yet validated.
    Configured,
    /// Validated and allocated; positions and evaluations are accepted.
    Ready,
}

impl SolverState {
    /// `true` once `initialize` has succeeded.
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Configured => write!(f, "configured"),
            Self::Ready => write!(f, "ready"),
        }
    }
}
