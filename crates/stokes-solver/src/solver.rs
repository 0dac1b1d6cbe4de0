//! The shared mobility contract and its generic implementation.
//!
//! [`Mobility`] is the call surface every solver exposes. [`MobilitySolver`]
//! implements it once for any [`Backend`]: it owns the lifecycle state,
//! the options and parameters, the position buffer and the random stream,
//! coerces caller data to the solver precision at each entry point and
//! composes the deterministic and fluctuating terms.

use std::fmt;
use std::time::Instant;

use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stokes_core::{
    coerce, ConfigError, MobilityError, OptionValue, Parameters, Periodicity, PositionBuffer,
    Precision, Scalar, SolverOptions, SolverState,
};

use crate::backend::Backend;
use crate::context::FluctuationContext;
use crate::krylov::KrylovWorkspace;
use crate::metrics::SolverMetrics;

/// Result of [`Mobility::mdot`].
#[derive(Clone, Debug, PartialEq)]
pub struct MdotOutput<T> {
    /// Deterministic product `M·F`.
    pub velocities: Vec<T>,
    /// Thermal term with covariance `2 k_B T M`, or zeros when not requested.
    pub fluctuation: Vec<T>,
}

/// Linear and (in torque mode) angular displacements or velocities.
#[derive(Clone, Debug, PartialEq)]
pub struct Displacements<T> {
    /// Translational part, length 3N.
    pub linear: Vec<T>,
    /// Rotational part, length 3N, present only when `needs_torque` is set.
    pub angular: Option<Vec<T>>,
}

/// Uniform call surface of every mobility solver.
///
/// Each instance computes at exactly one precision `T`. Methods taking
/// caller arrays accept either width `U` and cast once on entry.
///
/// # Lifecycle
///
/// `set_parameters`/`set_option` move an uninitialized solver to
/// [`SolverState::Configured`]; `initialize` validates and moves it to
/// [`SolverState::Ready`]. Positions and evaluations require `Ready`.
pub trait Mobility<T: Scalar> {
    /// Typed options accepted by [`set_parameters`](Self::set_parameters).
    type Options;

    /// Backend name.
    fn name(&self) -> &'static str;

    /// Precision every output is produced at.
    fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// Periodicity fixed at construction.
    fn periodicity(&self) -> Periodicity;

    /// Current lifecycle state.
    fn state(&self) -> SolverState;

    /// Particle count, once ready.
    fn number_particles(&self) -> Option<usize>;

    /// Replace the recorded backend options.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotReinitializable`] when called on a ready solver
    /// whose backend cannot be configured again.
    fn set_parameters(&mut self, options: Self::Options) -> Result<(), MobilityError>;

    /// Record one backend option by name.
    ///
    /// # Errors
    ///
    /// Unknown names and wrong value kinds fail immediately, as does a
    /// ready, non-reinitializable solver.
    fn set_option<V: Into<OptionValue>>(&mut self, name: &str, value: V)
        -> Result<(), MobilityError>;

    /// Validate all configuration and allocate the position buffer.
    ///
    /// # Errors
    ///
    /// A configuration error leaves the solver `Configured`.
    fn initialize(&mut self, params: Parameters) -> Result<(), MobilityError>;

    /// Replace all positions, `[x0, y0, z0, x1, ...]`.
    fn set_positions<U: Scalar>(&mut self, positions: &[U]) -> Result<(), MobilityError>;

    /// `M·F`, plus a thermal sample when `fluctuation` is set.
    fn mdot<U: Scalar>(
        &mut self,
        forces: &[U],
        fluctuation: bool,
    ) -> Result<MdotOutput<T>, MobilityError>;

    /// Full product with torques. Requires `needs_torque`.
    fn mdot_with_torques<U: Scalar>(
        &mut self,
        forces: &[U],
        torques: &[U],
    ) -> Result<Displacements<T>, MobilityError>;

    /// `prefactor · sqrt(2 k_B T M) · dW`.
    fn sqrt_mdot_w(&mut self, prefactor: f64) -> Result<Displacements<T>, MobilityError>;

    /// `M·F` (zero when `forces` is `None`) plus `sqrt_mdot_w(prefactor)`.
    fn hydrodynamic_velocities<U: Scalar>(
        &mut self,
        forces: Option<&[U]>,
        prefactor: f64,
    ) -> Result<Displacements<T>, MobilityError>;

    /// Release positions and caches and return to `Configured`.
    fn clean(&mut self);

    /// Evaluation counters and timings.
    fn metrics(&self) -> &SolverMetrics;
}

/// Lifecycle wrapper turning a [`Backend`] into a [`Mobility`] solver.
///
/// # Examples
///
/// See the `stokes` facade crate for end-to-end usage with the shipped
/// backends.
pub struct MobilitySolver<T: Scalar, B: Backend<T>> {
    backend: B,
    periodicity: Periodicity,
    state: SolverState,
    options: B::Options,
    params: Option<Parameters>,
    positions: PositionBuffer<T>,
    rng: ChaCha8Rng,
    workspace: KrylovWorkspace<T>,
    metrics: SolverMetrics,
}

impl<T: Scalar, B: Backend<T>> MobilitySolver<T, B> {
    /// Construct for `periodicity`.
    ///
    /// # Errors
    ///
    /// [`MobilityError::UnsupportedGeometry`] if the backend cannot
    /// represent the descriptor.
    pub fn new(periodicity: Periodicity) -> Result<Self, MobilityError> {
        let backend = B::new(periodicity)?;
        Ok(Self {
            backend,
            periodicity,
            state: SolverState::Uninitialized,
            options: B::Options::default(),
            params: None,
            positions: PositionBuffer::empty(),
            rng: ChaCha8Rng::seed_from_u64(0),
            workspace: KrylovWorkspace::new(),
            metrics: SolverMetrics::default(),
        })
    }

    /// The recorded options.
    pub fn options(&self) -> &B::Options {
        &self.options
    }

    /// The validated parameters, once ready.
    pub fn parameters(&self) -> Option<&Parameters> {
        self.params.as_ref()
    }

    /// Current positions at solver precision. Empty unless ready.
    pub fn positions(&self) -> &[T] {
        self.positions.as_slice()
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ready(&self, operation: &'static str) -> Result<&Parameters, MobilityError> {
        match (&self.params, self.state) {
            (Some(params), SolverState::Ready) => Ok(params),
            _ => Err(MobilityError::State {
                operation,
                state: self.state,
            }),
        }
    }

    fn check_configurable(&self) -> Result<(), MobilityError> {
        if self.state == SolverState::Ready && !B::REINITIALIZABLE {
            return Err(ConfigError::NotReinitializable { solver: B::NAME }.into());
        }
        Ok(())
    }

    fn mark_configured(&mut self) {
        if self.state == SolverState::Uninitialized {
            self.state = SolverState::Configured;
        }
    }

    fn try_initialize(&mut self, params: &Parameters) -> Result<(), ConfigError> {
        params.validate()?;
        if params.needs_torque && !B::SUPPORTS_TORQUE {
            return Err(ConfigError::TorqueUnsupported { solver: B::NAME });
        }
        self.backend.initialize(params, &self.options)
    }

    fn deterministic(
        &mut self,
        params: &Parameters,
        forces: &[T],
        torques: Option<&[T]>,
    ) -> Displacements<T> {
        let len = params.vector_len();
        let start = Instant::now();
        let mut linear = vec![T::zero(); len];
        let mut angular = torques.map(|_| vec![T::zero(); len]);
        self.backend.mdot(
            self.positions.as_slice(),
            forces,
            torques,
            &mut linear,
            angular.as_deref_mut(),
        );
        self.metrics.mdot_calls += 1;
        self.metrics.last_mdot_us = start.elapsed().as_micros() as u64;
        Displacements { linear, angular }
    }

    fn sample(&mut self, params: &Parameters, prefactor: f64) -> Displacements<T> {
        let len = params.vector_len();
        let mut linear = vec![T::zero(); len];
        let mut angular = params.needs_torque.then(|| vec![T::zero(); len]);
        let scale = prefactor * (2.0 * params.temperature).sqrt();
        if scale == 0.0 {
            return Displacements { linear, angular };
        }

        let start = Instant::now();
        let mut ctx = FluctuationContext::new(&mut self.rng, &mut self.workspace, params.tolerance);
        self.backend.sqrt_mdot_w(
            self.positions.as_slice(),
            &mut ctx,
            &mut linear,
            angular.as_deref_mut(),
        );
        if let Some(report) = ctx.report() {
            self.metrics.record_lanczos(report);
        }

        let s = T::from_real(scale);
        for v in linear.iter_mut().chain(angular.iter_mut().flatten()) {
            *v *= s;
        }
        self.metrics.fluctuation_calls += 1;
        self.metrics.last_fluctuation_us = start.elapsed().as_micros() as u64;
        Displacements { linear, angular }
    }
}

fn coerce_input<T: Scalar, U: Scalar>(
    input: &'static str,
    values: &[U],
    expected: usize,
) -> Result<Vec<T>, MobilityError> {
    if values.len() != expected {
        return Err(MobilityError::Shape {
            input,
            expected,
            found: values.len(),
        });
    }
    Ok(coerce(values))
}

fn check_prefactor(prefactor: f64) -> Result<(), MobilityError> {
    if prefactor.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name: "prefactor",
            value: prefactor,
            expected: "finite",
        }
        .into())
    }
}

impl<T: Scalar, B: Backend<T>> fmt::Debug for MobilitySolver<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MobilitySolver")
            .field("backend", &B::NAME)
            .field("precision", &T::PRECISION)
            .field("periodicity", &self.periodicity)
            .field("state", &self.state)
            .field("options", &self.options)
            .field("number_particles", &self.positions.number_particles())
            .finish_non_exhaustive()
    }
}

impl<T: Scalar, B: Backend<T>> Mobility<T> for MobilitySolver<T, B> {
    type Options = B::Options;

    fn name(&self) -> &'static str {
        B::NAME
    }

    fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    fn state(&self) -> SolverState {
        self.state
    }

    fn number_particles(&self) -> Option<usize> {
        self.ready("number_particles")
            .ok()
            .map(|p| p.number_particles)
    }

    fn set_parameters(&mut self, options: B::Options) -> Result<(), MobilityError> {
        self.check_configurable()?;
        self.options = options;
        self.mark_configured();
        Ok(())
    }

    fn set_option<V: Into<OptionValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<(), MobilityError> {
        self.check_configurable()?;
        self.options.set(name, value.into())?;
        self.mark_configured();
        Ok(())
    }

    fn initialize(&mut self, params: Parameters) -> Result<(), MobilityError> {
        self.check_configurable()?;
        if let Err(e) = self.try_initialize(&params) {
            self.state = SolverState::Configured;
            self.params = None;
            self.positions.clear();
            debug!("{}: initialize rejected: {e}", B::NAME);
            return Err(e.into());
        }

        let seed = if params.seed == 0 {
            rand::random()
        } else {
            params.seed
        };
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.positions = PositionBuffer::with_particles(params.number_particles);
        self.workspace.reset(0);
        self.metrics = SolverMetrics::default();
        debug!(
            "{}: initialized {} particles, {} precision, periodicity {}",
            B::NAME,
            params.number_particles,
            T::PRECISION,
            self.periodicity
        );
        self.params = Some(params);
        self.state = SolverState::Ready;
        Ok(())
    }

    fn set_positions<U: Scalar>(&mut self, positions: &[U]) -> Result<(), MobilityError> {
        self.ready("set_positions")?;
        self.positions.assign(positions)
    }

    fn mdot<U: Scalar>(
        &mut self,
        forces: &[U],
        fluctuation: bool,
    ) -> Result<MdotOutput<T>, MobilityError> {
        let params = self.ready("mdot")?.clone();
        let forces = coerce_input("forces", forces, params.vector_len())?;
        let velocities = self.deterministic(&params, &forces, None).linear;
        let fluctuation = if fluctuation {
            self.sample(&params, 1.0).linear
        } else {
            vec![T::zero(); params.vector_len()]
        };
        trace!(
            "{}: mdot over {} particles in {}us",
            B::NAME,
            params.number_particles,
            self.metrics.last_mdot_us
        );
        Ok(MdotOutput {
            velocities,
            fluctuation,
        })
    }

    fn mdot_with_torques<U: Scalar>(
        &mut self,
        forces: &[U],
        torques: &[U],
    ) -> Result<Displacements<T>, MobilityError> {
        let params = self.ready("mdot_with_torques")?.clone();
        if !params.needs_torque {
            return Err(ConfigError::TorqueNotConfigured.into());
        }
        let forces = coerce_input("forces", forces, params.vector_len())?;
        let torques = coerce_input("torques", torques, params.vector_len())?;
        Ok(self.deterministic(&params, &forces, Some(&torques)))
    }

    fn sqrt_mdot_w(&mut self, prefactor: f64) -> Result<Displacements<T>, MobilityError> {
        let params = self.ready("sqrt_mdot_w")?.clone();
        check_prefactor(prefactor)?;
        Ok(self.sample(&params, prefactor))
    }

    fn hydrodynamic_velocities<U: Scalar>(
        &mut self,
        forces: Option<&[U]>,
        prefactor: f64,
    ) -> Result<Displacements<T>, MobilityError> {
        let params = self.ready("hydrodynamic_velocities")?.clone();
        check_prefactor(prefactor)?;
        let mut out = match forces {
            Some(forces) => {
                let forces = coerce_input("forces", forces, params.vector_len())?;
                let torques = params
                    .needs_torque
                    .then(|| vec![T::zero(); params.vector_len()]);
                self.deterministic(&params, &forces, torques.as_deref())
            }
            None => Displacements {
                linear: vec![T::zero(); params.vector_len()],
                angular: params
                    .needs_torque
                    .then(|| vec![T::zero(); params.vector_len()]),
            },
        };
        let noise = self.sample(&params, prefactor);
        for (v, n) in out.linear.iter_mut().zip(&noise.linear) {
            *v += *n;
        }
        if let (Some(w), Some(n)) = (out.angular.as_mut(), noise.angular.as_ref()) {
            for (v, n) in w.iter_mut().zip(n) {
                *v += *n;
            }
        }
        Ok(out)
    }

    fn clean(&mut self) {
        self.backend.clean();
        self.positions.clear();
        self.workspace.release();
        self.params = None;
        if self.state == SolverState::Ready {
            self.state = SolverState::Configured;
        }
        debug!("{}: cleaned", B::NAME);
    }

    fn metrics(&self) -> &SolverMetrics {
        &self.metrics
    }
}
