//! Per-axis boundary classification of the simulation domain.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::MobilityError;

/// Boundary behavior along one spatial axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeriodicityMode {
    /// Unbounded fluid.
    Open,
    /// Bounded below by a single no-slip wall.
    SingleWall,
    /// Confined between two no-slip walls.
    TwoWalls,
    /// Periodic images.
    Periodic,
    /// Not stated. Parses and prints so descriptors read from
    /// configuration round-trip; every backend rejects it at construction.
    Unspecified,
}

impl PeriodicityMode {
    /// All modes, in declaration order.
    pub const ALL: [PeriodicityMode; 5] = [
        Self::Open,
        Self::SingleWall,
        Self::TwoWalls,
        Self::Periodic,
        Self::Unspecified,
    ];

    /// Canonical lowercase name (`"open"`, `"single_wall"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::SingleWall => "single_wall",
            Self::TwoWalls => "two_walls",
            Self::Periodic => "periodic",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for PeriodicityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PeriodicityMode {
    type Err = MobilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| MobilityError::InvalidPeriodicity {
                value: s.to_string(),
            })
    }
}

/// Periodicity descriptor for the three spatial axes.
///
/// Fixed when a solver is constructed and immutable afterwards.
///
/// # Examples
///
/// ```
/// use stokes_core::{Periodicity, PeriodicityMode};
///
/// let p = Periodicity::from_names("open", "open", "single_wall").unwrap();
/// assert_eq!(p, Periodicity::bottom_wall());
/// assert_eq!(p.z, PeriodicityMode::SingleWall);
/// assert_eq!(p.to_string(), "(open, open, single_wall)");
///
/// assert!(Periodicity::from_names("periodicasdas", "periodic", "open").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Periodicity {
    /// Behavior along x.
    pub x: PeriodicityMode,
    /// Behavior along y.
    pub y: PeriodicityMode,
    /// Behavior along z.
    pub z: PeriodicityMode,
}

/// Inline list of periodicity descriptors, used for backend capability tables.
pub type PeriodicitySet = SmallVec<[Periodicity; 4]>;

impl Periodicity {
    /// Build a descriptor from three per-axis modes.
    pub const fn new(x: PeriodicityMode, y: PeriodicityMode, z: PeriodicityMode) -> Self {
        Self { x, y, z }
    }

    /// Parse a descriptor from three mode names.
    pub fn from_names(x: &str, y: &str, z: &str) -> Result<Self, MobilityError> {
        Ok(Self::new(x.parse()?, y.parse()?, z.parse()?))
    }

    /// Unbounded in all directions.
    pub const fn open() -> Self {
        Self::new(
            PeriodicityMode::Open,
            PeriodicityMode::Open,
            PeriodicityMode::Open,
        )
    }

    /// Unbounded in the plane, single wall at `z = 0`.
    pub const fn bottom_wall() -> Self {
        Self::new(
            PeriodicityMode::Open,
            PeriodicityMode::Open,
            PeriodicityMode::SingleWall,
        )
    }

    /// Periodic along all three axes.
    pub const fn triply_periodic() -> Self {
        Self::new(
            PeriodicityMode::Periodic,
            PeriodicityMode::Periodic,
            PeriodicityMode::Periodic,
        )
    }

    /// Periodic in the plane, unbounded along z.
    pub const fn doubly_periodic() -> Self {
        Self::new(
            PeriodicityMode::Periodic,
            PeriodicityMode::Periodic,
            PeriodicityMode::Open,
        )
    }

    /// Periodic in the plane, single wall at `z = 0`.
    pub const fn doubly_periodic_wall() -> Self {
        Self::new(
            PeriodicityMode::Periodic,
            PeriodicityMode::Periodic,
            PeriodicityMode::SingleWall,
        )
    }

    /// The three modes as an array, `[x, y, z]`.
    pub fn axes(&self) -> [PeriodicityMode; 3] {
        [self.x, self.y, self.z]
    }

    /// Number of periodic axes.
    pub fn periodic_axes(&self) -> usize {
        self.axes()
            .iter()
            .filter(|m| **m == PeriodicityMode::Periodic)
            .count()
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn named_constructors() {
        assert_eq!(
            Periodicity::from_names("open", "open", "open").unwrap(),
            Periodicity::open()
        );
        assert_eq!(
            Periodicity::from_names("periodic", "periodic", "periodic").unwrap(),
            Periodicity::triply_periodic()
        );
        assert_eq!(Periodicity::triply_periodic().periodic_axes(), 3);
        assert_eq!(Periodicity::bottom_wall().periodic_axes(), 0);
        assert_eq!(
            Periodicity::from_names("periodic", "periodic", "single_wall").unwrap(),
            Periodicity::doubly_periodic_wall()
        );
        assert_eq!(Periodicity::doubly_periodic().periodic_axes(), 2);
    }

    #[test]
    fn unspecified_round_trips() {
        let p = Periodicity::from_names("unspecified", "periodic", "open").unwrap();
        assert_eq!(p.x, PeriodicityMode::Unspecified);
        assert_eq!(p.to_string(), "(unspecified, periodic, open)");
    }

    #[test]
    fn invalid_name_is_rejected() {
        let err = Periodicity::from_names("periodicasdas", "periodic", "open").unwrap_err();
        assert!(matches!(
            err,
            MobilityError::InvalidPeriodicity { ref value } if value == "periodicasdas"
        ));
    }

    proptest! {
        #[test]
        fn name_round_trips(i in 0usize..5) {
            let mode = PeriodicityMode::ALL[i];
            prop_assert_eq!(mode.name().parse::<PeriodicityMode>().unwrap(), mode);
        }

        #[test]
        fn arbitrary_strings_never_panic(s in "\\PC*") {
            let parsed = s.parse::<PeriodicityMode>();
            prop_assert_eq!(parsed.is_ok(), PeriodicityMode::ALL.iter().any(|m| m.name() == s));
        }
    }
}
