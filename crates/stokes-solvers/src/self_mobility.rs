//! Isolated particles: no hydrodynamic interactions.
//!
//! `M = I / (6 π η a)` for translation and `I / (8 π η a³)` for rotation.
//! The square root is exact, so fluctuations never go through Krylov
//! iteration.

use smallvec::smallvec;
use stokes_core::{
    ConfigError, MobilityError, OptionSpec, OptionValue, Parameters, Periodicity, PeriodicitySet,
    Scalar, SolverOptions,
};
use stokes_solver::{check_geometry, Backend, FluctuationContext};

/// `SelfMobility` takes no options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelfMobilityOptions;

impl SolverOptions for SelfMobilityOptions {
    const SOLVER: &'static str = "SelfMobility";

    fn specs() -> &'static [OptionSpec] {
        &[]
    }

    fn set(&mut self, name: &str, _value: OptionValue) -> Result<(), ConfigError> {
        Self::spec(name).map(|_| ())
    }
}

/// Diagonal mobility of non-interacting spheres in unbounded fluid.
#[derive(Debug, Default)]
pub struct SelfMobility {
    linear: f64,
    angular: f64,
}

impl SelfMobility {
    /// Translational self-mobility set by the last `initialize`.
    pub fn translational(&self) -> f64 {
        self.linear
    }

    /// Rotational self-mobility set by the last `initialize`.
    pub fn rotational(&self) -> f64 {
        self.angular
    }
}

fn scale_into<T: Scalar>(out: &mut [T], input: &[T], factor: f64) {
    let m = T::from_real(factor);
    for (o, &x) in out.iter_mut().zip(input) {
        *o = m * x;
    }
}

impl<T: Scalar> Backend<T> for SelfMobility {
    type Options = SelfMobilityOptions;
    const NAME: &'static str = "SelfMobility";
    const SUPPORTS_TORQUE: bool = true;

    fn supported_periodicities() -> PeriodicitySet {
        smallvec![Periodicity::open()]
    }

    fn new(periodicity: Periodicity) -> Result<Self, MobilityError> {
        check_geometry::<T, Self>(periodicity)?;
        Ok(Self::default())
    }

    fn initialize(
        &mut self,
        params: &Parameters,
        _options: &SelfMobilityOptions,
    ) -> Result<(), ConfigError> {
        self.linear = params.translational_self_mobility();
        self.angular = params.rotational_self_mobility();
        Ok(())
    }

    fn mdot(
        &self,
        _positions: &[T],
        forces: &[T],
        torques: Option<&[T]>,
        linear: &mut [T],
        angular: Option<&mut [T]>,
    ) {
        scale_into(linear, forces, self.linear);
        if let (Some(torques), Some(angular)) = (torques, angular) {
            scale_into(angular, torques, self.angular);
        }
    }

    fn sqrt_mdot_w(
        &self,
        _positions: &[T],
        ctx: &mut FluctuationContext<'_, T>,
        linear: &mut [T],
        angular: Option<&mut [T]>,
    ) {
        ctx.fill_normal(linear);
        let s = T::from_real(self.linear.sqrt());
        linear.iter_mut().for_each(|v| *v *= s);
        if let Some(angular) = angular {
            ctx.fill_normal(angular);
            let s = T::from_real(self.angular.sqrt());
            angular.iter_mut().for_each(|v| *v *= s);
        }
    }
}
