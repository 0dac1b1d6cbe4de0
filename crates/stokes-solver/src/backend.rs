//! The [`Backend`] trait implemented by each geometry-specific algorithm.
//!
//! A backend owns nothing but its own precomputed state. Positions,
//! forces and outputs are lent to it per call by
//! [`MobilitySolver`](crate::MobilitySolver), already coerced to the
//! solver precision and shape-checked.

use stokes_core::{
    ConfigError, MobilityError, Parameters, Periodicity, PeriodicitySet, Scalar, SolverOptions,
};

use crate::context::FluctuationContext;
use crate::lanczos::sqrt_mdot_noise;

/// A mobility algorithm for one class of periodicity descriptors.
///
/// # Contract
///
/// - `mdot()` MUST be deterministic: same positions and forces give
///   bit-identical output. It receives zeroed output buffers.
/// - `torques` and `angular` are either both `Some` or both `None`;
///   they are only `Some` for backends with `SUPPORTS_TORQUE`.
/// - `sqrt_mdot_w()` writes `sqrt(M)·z` for a fresh standard normal `z`
///   drawn from the context, at unit temperature and prefactor. The
///   caller applies `sqrt(2 k_B T)` and the prefactor.
///
/// # Examples
///
/// A backend with a constant diagonal mobility:
///
/// ```
/// use smallvec::smallvec;
/// use stokes_core::{
///     ConfigError, MobilityError, OptionSpec, OptionValue, Parameters, Periodicity,
///     PeriodicitySet, SolverOptions,
/// };
/// use stokes_solver::{check_geometry, Backend};
///
/// #[derive(Clone, Debug, Default)]
/// struct NoOptions;
///
/// impl SolverOptions for NoOptions {
///     const SOLVER: &'static str = "Scaled";
///     fn specs() -> &'static [OptionSpec] { &[] }
///     fn set(&mut self, name: &str, _: OptionValue) -> Result<(), ConfigError> {
///         Self::spec(name).map(|_| ())
///     }
/// }
///
/// struct Scaled { mu: f64 }
///
/// impl Backend<f64> for Scaled {
///     type Options = NoOptions;
///     const NAME: &'static str = "Scaled";
///
///     fn supported_periodicities() -> PeriodicitySet {
///         smallvec![Periodicity::open()]
///     }
///
///     fn new(periodicity: Periodicity) -> Result<Self, MobilityError> {
///         check_geometry::<f64, Self>(periodicity)?;
///         Ok(Self { mu: 0.0 })
///     }
///
///     fn initialize(&mut self, params: &Parameters, _: &NoOptions) -> Result<(), ConfigError> {
///         self.mu = params.translational_self_mobility();
///         Ok(())
///     }
///
///     fn mdot(&self, _: &[f64], forces: &[f64], _: Option<&[f64]>,
///             linear: &mut [f64], _: Option<&mut [f64]>) {
///         for (v, f) in linear.iter_mut().zip(forces) {
///             *v = self.mu * f;
///         }
///     }
/// }
///
/// assert!(Scaled::new(Periodicity::triply_periodic()).is_err());
/// ```
pub trait Backend<T: Scalar>: Sized + Send + 'static {
    /// Typed option table accepted by `set_parameters`.
    type Options: SolverOptions;

    /// Registry name, e.g. `"NBody"`.
    const NAME: &'static str;

    /// Whether `initialize` may be called again once ready.
    const REINITIALIZABLE: bool = true;

    /// Whether torques and angular velocities are supported.
    const SUPPORTS_TORQUE: bool = false;

    /// Periodicity descriptors this backend can represent.
    fn supported_periodicities() -> PeriodicitySet;

    /// Construct for `periodicity`.
    ///
    /// # Errors
    ///
    /// [`MobilityError::UnsupportedGeometry`] if the descriptor is not in
    /// [`supported_periodicities`](Self::supported_periodicities).
    fn new(periodicity: Periodicity) -> Result<Self, MobilityError>;

    /// Validate options against the (already validated) global
    /// parameters and precompute whatever the kernel needs.
    fn initialize(&mut self, params: &Parameters, options: &Self::Options)
        -> Result<(), ConfigError>;

    /// Deterministic product `M·F` (and the rotational blocks when
    /// torques are present).
    fn mdot(
        &self,
        positions: &[T],
        forces: &[T],
        torques: Option<&[T]>,
        linear: &mut [T],
        angular: Option<&mut [T]>,
    );

    /// `sqrt(M)·z` for a fresh standard normal `z`.
    ///
    /// Default: Krylov approximation through repeated [`mdot`](Self::mdot)
    /// calls, with translational and rotational parts stacked into one
    /// vector when torques are enabled.
    fn sqrt_mdot_w(
        &self,
        positions: &[T],
        ctx: &mut FluctuationContext<'_, T>,
        linear: &mut [T],
        angular: Option<&mut [T]>,
    ) {
        match angular {
            None => {
                sqrt_mdot_noise(ctx, linear, |v, mv| {
                    self.mdot(positions, v, None, mv, None)
                });
            }
            Some(angular) => {
                let split = linear.len();
                let mut stacked = vec![T::zero(); split + angular.len()];
                sqrt_mdot_noise(ctx, &mut stacked, |v, mv| {
                    let (forces, torques) = v.split_at(split);
                    let (lin, ang) = mv.split_at_mut(split);
                    self.mdot(positions, forces, Some(torques), lin, Some(ang))
                });
                linear.copy_from_slice(&stacked[..split]);
                angular.copy_from_slice(&stacked[split..]);
            }
        }
    }

    /// Release caches. The backend is re-initialized before further use.
    fn clean(&mut self) {}
}

/// Reject descriptors that `B` does not list as supported.
pub fn check_geometry<T: Scalar, B: Backend<T>>(
    periodicity: Periodicity,
) -> Result<(), MobilityError> {
    if B::supported_periodicities().contains(&periodicity) {
        Ok(())
    } else {
        Err(MobilityError::UnsupportedGeometry {
            solver: B::NAME,
            periodicity,
        })
    }
}
