//! Closed set of backends, selectable by name or by geometry.
//!
//! [`Solver`] wraps one [`MobilitySolver`] per backend behind a single
//! type so callers can pick the algorithm at run time. Dispatch is a
//! plain `match`; every variant exposes the same [`Mobility`] contract.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use stokes_core::{
    ConfigError, MobilityError, OptionSpec, OptionValue, Parameters, Periodicity, PeriodicitySet,
    Precision, Scalar, SolverOptions, SolverState,
};
use stokes_solver::{Backend, Displacements, MdotOutput, Mobility, MobilitySolver, SolverMetrics};

use crate::doubly_periodic::{DoublyPeriodicRpy, DoublyPeriodicRpyOptions};
use crate::nbody::{NBody, NBodyOptions};
use crate::self_mobility::{SelfMobility, SelfMobilityOptions};
use crate::spectral::{SpectralRpy, SpectralRpyOptions};

/// Identifies a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Non-interacting particles.
    SelfMobility,
    /// All-pairs RPY, free space or above a wall.
    NBody,
    /// Triply periodic spectral RPY.
    SpectralRpy,
    /// Periodic in the plane, open or walled along z.
    DoublyPeriodicRpy,
}

impl SolverKind {
    /// Every backend, in auto-selection preference order.
    pub const ALL: [SolverKind; 4] = [
        SolverKind::NBody,
        SolverKind::SpectralRpy,
        SolverKind::DoublyPeriodicRpy,
        SolverKind::SelfMobility,
    ];

    /// Registered name.
    pub fn name(self) -> &'static str {
        match self {
            Self::SelfMobility => <SelfMobilityOptions as SolverOptions>::SOLVER,
            Self::NBody => <NBodyOptions as SolverOptions>::SOLVER,
            Self::SpectralRpy => <SpectralRpyOptions as SolverOptions>::SOLVER,
            Self::DoublyPeriodicRpy => <DoublyPeriodicRpyOptions as SolverOptions>::SOLVER,
        }
    }

    /// Periodicities the backend accepts at construction.
    pub fn supported_periodicities(self) -> PeriodicitySet {
        match self {
            Self::SelfMobility => <SelfMobility as Backend<f64>>::supported_periodicities(),
            Self::NBody => <NBody as Backend<f64>>::supported_periodicities(),
            Self::SpectralRpy => <SpectralRpy as Backend<f64>>::supported_periodicities(),
            Self::DoublyPeriodicRpy => {
                <DoublyPeriodicRpy as Backend<f64>>::supported_periodicities()
            }
        }
    }

    /// Whether `periodicity` is accepted.
    pub fn supports(self, periodicity: Periodicity) -> bool {
        self.supported_periodicities().contains(&periodicity)
    }

    /// Declared options.
    pub fn option_specs(self) -> &'static [OptionSpec] {
        match self {
            Self::SelfMobility => SelfMobilityOptions::specs(),
            Self::NBody => NBodyOptions::specs(),
            Self::SpectralRpy => SpectralRpyOptions::specs(),
            Self::DoublyPeriodicRpy => DoublyPeriodicRpyOptions::specs(),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        registry()
            .get(s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownSolver {
                name: s.to_string(),
            })
    }
}

/// Backends by name, in [`SolverKind::ALL`] order.
pub fn registry() -> IndexMap<&'static str, SolverKind> {
    SolverKind::ALL.iter().map(|&k| (k.name(), k)).collect()
}

/// Preferred backend for every supported periodicity.
pub fn routes() -> IndexMap<Periodicity, SolverKind> {
    let mut routes = IndexMap::new();
    for kind in SolverKind::ALL {
        for p in kind.supported_periodicities() {
            routes.entry(p).or_insert(kind);
        }
    }
    routes
}

/// The preferred backend for `periodicity`.
///
/// # Errors
///
/// [`MobilityError::UnsupportedGeometry`] if no backend accepts it.
///
/// # Examples
///
/// ```
/// use stokes_core::Periodicity;
/// use stokes_solvers::{select, SolverKind};
///
/// assert_eq!(select(Periodicity::open()).unwrap(), SolverKind::NBody);
/// assert_eq!(select(Periodicity::triply_periodic()).unwrap(), SolverKind::SpectralRpy);
/// ```
pub fn select(periodicity: Periodicity) -> Result<SolverKind, MobilityError> {
    routes()
        .get(&periodicity)
        .copied()
        .ok_or(MobilityError::UnsupportedGeometry {
            solver: "registry",
            periodicity,
        })
}

/// Options for any registered backend.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverParameters {
    /// Options for [`SolverKind::SelfMobility`].
    SelfMobility(SelfMobilityOptions),
    /// Options for [`SolverKind::NBody`].
    NBody(NBodyOptions),
    /// Options for [`SolverKind::SpectralRpy`].
    SpectralRpy(SpectralRpyOptions),
    /// Options for [`SolverKind::DoublyPeriodicRpy`].
    DoublyPeriodicRpy(DoublyPeriodicRpyOptions),
}

impl SolverParameters {
    /// The backend these options belong to.
    pub fn kind(&self) -> SolverKind {
        match self {
            Self::SelfMobility(_) => SolverKind::SelfMobility,
            Self::NBody(_) => SolverKind::NBody,
            Self::SpectralRpy(_) => SolverKind::SpectralRpy,
            Self::DoublyPeriodicRpy(_) => SolverKind::DoublyPeriodicRpy,
        }
    }
}

impl From<SelfMobilityOptions> for SolverParameters {
    fn from(o: SelfMobilityOptions) -> Self {
        Self::SelfMobility(o)
    }
}

impl From<NBodyOptions> for SolverParameters {
    fn from(o: NBodyOptions) -> Self {
        Self::NBody(o)
    }
}

impl From<SpectralRpyOptions> for SolverParameters {
    fn from(o: SpectralRpyOptions) -> Self {
        Self::SpectralRpy(o)
    }
}

impl From<DoublyPeriodicRpyOptions> for SolverParameters {
    fn from(o: DoublyPeriodicRpyOptions) -> Self {
        Self::DoublyPeriodicRpy(o)
    }
}

/// A solver whose backend is chosen at run time.
///
/// # Examples
///
/// ```
/// use stokes_core::{Parameters, Periodicity};
/// use stokes_solver::Mobility;
/// use stokes_solvers::{Solver, SpectralRpyOptions};
///
/// let mut solver = Solver::<f64>::from_name("SpectralRpy", Periodicity::triply_periodic())?;
/// solver.set_parameters(SpectralRpyOptions::cubic(16.0).with_cutoff(4.0).into())?;
/// solver.initialize(Parameters::new(1.0, 1.0, 1.0, 2))?;
/// solver.set_positions(&[0.0f32, 0.0, 0.0, 4.0, 0.0, 0.0])?;
/// let out = solver.mdot(&[1.0f64, 0.0, 0.0, 0.0, 0.0, 0.0], false)?;
/// assert!(out.velocities[0] > 0.0);
/// # Ok::<(), stokes_core::MobilityError>(())
/// ```
#[derive(Debug)]
pub enum Solver<T: Scalar> {
    /// Non-interacting particles.
    SelfMobility(MobilitySolver<T, SelfMobility>),
    /// All-pairs RPY.
    NBody(MobilitySolver<T, NBody>),
    /// Triply periodic spectral RPY.
    SpectralRpy(MobilitySolver<T, SpectralRpy>),
    /// Doubly periodic RPY.
    DoublyPeriodicRpy(MobilitySolver<T, DoublyPeriodicRpy>),
}

macro_rules! dispatch {
    ($solver:expr, $inner:ident => $body:expr) => {
        match $solver {
            Solver::SelfMobility($inner) => $body,
            Solver::NBody($inner) => $body,
            Solver::SpectralRpy($inner) => $body,
            Solver::DoublyPeriodicRpy($inner) => $body,
        }
    };
}

impl<T: Scalar> Solver<T> {
    /// Construct `kind` for `periodicity`.
    ///
    /// # Errors
    ///
    /// [`MobilityError::UnsupportedGeometry`] if the backend rejects the
    /// geometry.
    pub fn new(kind: SolverKind, periodicity: Periodicity) -> Result<Self, MobilityError> {
        Ok(match kind {
            SolverKind::SelfMobility => Self::SelfMobility(MobilitySolver::new(periodicity)?),
            SolverKind::NBody => Self::NBody(MobilitySolver::new(periodicity)?),
            SolverKind::SpectralRpy => Self::SpectralRpy(MobilitySolver::new(periodicity)?),
            SolverKind::DoublyPeriodicRpy => {
                Self::DoublyPeriodicRpy(MobilitySolver::new(periodicity)?)
            }
        })
    }

    /// Construct the backend registered as `name`.
    pub fn from_name(name: &str, periodicity: Periodicity) -> Result<Self, MobilityError> {
        Self::new(name.parse()?, periodicity)
    }

    /// Construct the preferred backend for `periodicity`.
    pub fn auto(periodicity: Periodicity) -> Result<Self, MobilityError> {
        Self::new(select(periodicity)?, periodicity)
    }

    /// The active backend.
    pub fn kind(&self) -> SolverKind {
        match self {
            Self::SelfMobility(_) => SolverKind::SelfMobility,
            Self::NBody(_) => SolverKind::NBody,
            Self::SpectralRpy(_) => SolverKind::SpectralRpy,
            Self::DoublyPeriodicRpy(_) => SolverKind::DoublyPeriodicRpy,
        }
    }

    /// Current global parameters, if initialized.
    pub fn parameters(&self) -> Option<&Parameters> {
        dispatch!(self, s => s.parameters())
    }

    /// Current positions in solver precision.
    pub fn positions(&self) -> &[T] {
        dispatch!(self, s => s.positions())
    }
}

impl<T: Scalar> Mobility<T> for Solver<T> {
    type Options = SolverParameters;

    fn name(&self) -> &'static str {
        dispatch!(self, s => s.name())
    }

    fn precision(&self) -> Precision {
        dispatch!(self, s => s.precision())
    }

    fn periodicity(&self) -> Periodicity {
        dispatch!(self, s => s.periodicity())
    }

    fn state(&self) -> SolverState {
        dispatch!(self, s => s.state())
    }

    fn number_particles(&self) -> Option<usize> {
        dispatch!(self, s => s.number_particles())
    }

    fn set_parameters(&mut self, options: SolverParameters) -> Result<(), MobilityError> {
        match (self, options) {
            (Self::SelfMobility(s), SolverParameters::SelfMobility(o)) => s.set_parameters(o),
            (Self::NBody(s), SolverParameters::NBody(o)) => s.set_parameters(o),
            (Self::SpectralRpy(s), SolverParameters::SpectralRpy(o)) => s.set_parameters(o),
            (Self::DoublyPeriodicRpy(s), SolverParameters::DoublyPeriodicRpy(o)) => {
                s.set_parameters(o)
            }
            (solver, options) => Err(ConfigError::SolverMismatch {
                expected: options.kind().name(),
                found: solver.kind().name(),
            }
            .into()),
        }
    }

    fn set_option<V: Into<OptionValue>>(&mut self, name: &str, value: V) -> Result<(), MobilityError> {
        dispatch!(self, s => s.set_option(name, value))
    }

    fn initialize(&mut self, params: Parameters) -> Result<(), MobilityError> {
        dispatch!(self, s => s.initialize(params))
    }

    fn set_positions<U: Scalar>(&mut self, positions: &[U]) -> Result<(), MobilityError> {
        dispatch!(self, s => s.set_positions(positions))
    }

    fn mdot<U: Scalar>(
        &mut self,
        forces: &[U],
        fluctuation: bool,
    ) -> Result<MdotOutput<T>, MobilityError> {
        dispatch!(self, s => s.mdot(forces, fluctuation))
    }

    fn mdot_with_torques<U: Scalar>(
        &mut self,
        forces: &[U],
        torques: &[U],
    ) -> Result<Displacements<T>, MobilityError> {
        dispatch!(self, s => s.mdot_with_torques(forces, torques))
    }

    fn sqrt_mdot_w(&mut self, prefactor: f64) -> Result<Displacements<T>, MobilityError> {
        dispatch!(self, s => s.sqrt_mdot_w(prefactor))
    }

    fn hydrodynamic_velocities<U: Scalar>(
        &mut self,
        forces: Option<&[U]>,
        prefactor: f64,
    ) -> Result<Displacements<T>, MobilityError> {
        dispatch!(self, s => s.hydrodynamic_velocities(forces, prefactor))
    }

    fn clean(&mut self) {
        dispatch!(self, s => s.clean())
    }

    fn metrics(&self) -> &SolverMetrics {
        dispatch!(self, s => s.metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stokes_core::PeriodicityMode;

    #[test]
    fn names_round_trip() {
        for kind in SolverKind::ALL {
            assert_eq!(kind.name().parse::<SolverKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(
            "Stokesian".parse::<SolverKind>(),
            Err(ConfigError::UnknownSolver {
                name: "Stokesian".into()
            })
        );
    }

    #[test]
    fn registry_keeps_preference_order() {
        let names: Vec<_> = registry().keys().copied().collect();
        assert_eq!(
            names,
            ["NBody", "SpectralRpy", "DoublyPeriodicRpy", "SelfMobility"]
        );
    }

    #[test]
    fn auto_selection() {
        assert_eq!(select(Periodicity::open()), Ok(SolverKind::NBody));
        assert_eq!(select(Periodicity::bottom_wall()), Ok(SolverKind::NBody));
        assert_eq!(
            select(Periodicity::triply_periodic()),
            Ok(SolverKind::SpectralRpy)
        );
        assert_eq!(
            select(Periodicity::doubly_periodic()),
            Ok(SolverKind::DoublyPeriodicRpy)
        );
        assert_eq!(
            select(Periodicity::doubly_periodic_wall()),
            Ok(SolverKind::DoublyPeriodicRpy)
        );
        let channel = Periodicity::from_names("periodic", "periodic", "two_walls").unwrap();
        assert!(matches!(
            select(channel),
            Err(MobilityError::UnsupportedGeometry { .. })
        ));
        assert_eq!(routes().len(), 5);
    }

    #[test]
    fn unspecified_axes_are_rejected_everywhere() {
        let vague = Periodicity::from_names("periodic", "periodic", "unspecified").unwrap();
        assert!(select(vague).is_err());
        for kind in SolverKind::ALL {
            assert!(!kind
                .supported_periodicities()
                .iter()
                .flat_map(|p| p.axes())
                .any(|m| m == PeriodicityMode::Unspecified));
            assert!(matches!(
                Solver::<f64>::new(kind, vague),
                Err(MobilityError::UnsupportedGeometry { .. })
            ));
        }
    }

    #[test]
    fn option_tables() {
        assert!(SolverKind::SelfMobility.option_specs().is_empty());
        assert_eq!(SolverKind::NBody.option_specs().len(), 2);
        let required: Vec<_> = SolverKind::SpectralRpy
            .option_specs()
            .iter()
            .filter(|s| s.required)
            .map(|s| s.name)
            .collect();
        assert_eq!(required, ["lx", "ly", "lz"]);
        let optional: Vec<_> = SolverKind::DoublyPeriodicRpy
            .option_specs()
            .iter()
            .filter(|s| !s.required)
            .map(|s| s.name)
            .collect();
        assert_eq!(optional, ["zmin", "zmax", "wavenumber_cutoff"]);
    }

    #[test]
    fn construction_checks_geometry() {
        assert!(Solver::<f32>::new(SolverKind::SelfMobility, Periodicity::bottom_wall()).is_err());
        let s = Solver::<f32>::auto(Periodicity::bottom_wall()).unwrap();
        assert_eq!(s.kind(), SolverKind::NBody);
        assert_eq!(s.precision(), Precision::Narrow);
        assert_eq!(s.state(), SolverState::Uninitialized);
        assert!(matches!(
            Solver::<f64>::from_name("Ewald", Periodicity::open()),
            Err(MobilityError::Config(ConfigError::UnknownSolver { .. }))
        ));
    }

    #[test]
    fn mismatched_options_are_rejected() {
        let mut s = Solver::<f64>::new(SolverKind::NBody, Periodicity::open()).unwrap();
        let err = s
            .set_parameters(SpectralRpyOptions::cubic(8.0).into())
            .unwrap_err();
        assert_eq!(
            err,
            MobilityError::Config(ConfigError::SolverMismatch {
                expected: "SpectralRpy",
                found: "NBody",
            })
        );
        s.set_parameters(NBodyOptions::default().into()).unwrap();
        assert_eq!(s.state(), SolverState::Configured);
    }

    #[test]
    fn dispatch_reaches_backend() {
        let mut s = Solver::<f64>::auto(Periodicity::open()).unwrap();
        s.set_option("n_per_batch", 1).unwrap();
        s.initialize(Parameters::new(1.0, 1.0, 1.0, 2)).unwrap();
        assert_eq!(s.number_particles(), Some(2));
        s.set_positions(&[0.0f64, 0.0, 0.0, 2.5, 0.0, 0.0]).unwrap();
        // One particle per batch: no coupling.
        let out = s.mdot(&[1.0f32, 0.0, 0.0, 0.0, 0.0, 0.0], false).unwrap();
        assert_eq!(out.velocities[3], 0.0);
        assert_eq!(s.metrics().mdot_calls, 1);
        s.clean();
        assert_eq!(s.state(), SolverState::Configured);
    }
}
