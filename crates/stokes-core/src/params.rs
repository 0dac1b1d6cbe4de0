//! Global physical parameters shared by every backend.

use std::f64::consts::PI;

use crate::error::ConfigError;

/// Default relative tolerance of the Krylov square-root sampler.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Physical constants and particle count, fixed by `initialize`.
///
/// Held in `f64` regardless of solver precision; backends cast once.
///
/// # Examples
///
/// ```
/// use stokes_core::Parameters;
///
/// let params = Parameters::new(1.0, 1.0, 1.0, 4).with_seed(7);
/// assert!(params.validate().is_ok());
/// assert!(Parameters::new(1.0, 0.0, 1.0, 4).validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Thermal energy k_B T. Must be `>= 0`.
    pub temperature: f64,
    /// Fluid viscosity. Must be `> 0`.
    pub viscosity: f64,
    /// Particle hydrodynamic radius. Must be `> 0`.
    pub hydrodynamic_radius: f64,
    /// Number of particles. Must be `>= 1`.
    pub number_particles: usize,
    /// Relative tolerance for iterative square-root sampling, in `(0, 1)`.
    pub tolerance: f64,
    /// Fluctuation RNG seed. `0` draws a seed from OS entropy.
    pub seed: u64,
    /// Whether torques and angular velocities are part of the evaluation.
    pub needs_torque: bool,
}

impl Parameters {
    /// Parameters with default tolerance, entropy seed and no torques.
    pub fn new(
        temperature: f64,
        viscosity: f64,
        hydrodynamic_radius: f64,
        number_particles: usize,
    ) -> Self {
        Self {
            temperature,
            viscosity,
            hydrodynamic_radius,
            number_particles,
            tolerance: DEFAULT_TOLERANCE,
            seed: 0,
            needs_torque: false,
        }
    }

    /// Set the square-root sampler tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the fluctuation RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable torque coupling.
    pub fn with_torque(mut self, needs_torque: bool) -> Self {
        self.needs_torque = needs_torque;
        self
    }

    /// Check every field against its domain.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(out_of_range("temperature", self.temperature, "finite, >= 0"));
        }
        if !(self.viscosity.is_finite() && self.viscosity > 0.0) {
            return Err(out_of_range("viscosity", self.viscosity, "finite, > 0"));
        }
        if !(self.hydrodynamic_radius.is_finite() && self.hydrodynamic_radius > 0.0) {
            return Err(out_of_range(
                "hydrodynamic_radius",
                self.hydrodynamic_radius,
                "finite, > 0",
            ));
        }
        if self.number_particles == 0 {
            return Err(out_of_range("number_particles", 0.0, ">= 1"));
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(out_of_range("tolerance", self.tolerance, "in (0, 1)"));
        }
        Ok(())
    }

    /// Translational self-mobility of an isolated sphere, `1 / (6 π η a)`.
    pub fn translational_self_mobility(&self) -> f64 {
        1.0 / (6.0 * PI * self.viscosity * self.hydrodynamic_radius)
    }

    /// Rotational self-mobility of an isolated sphere, `1 / (8 π η a³)`.
    pub fn rotational_self_mobility(&self) -> f64 {
        1.0 / (8.0 * PI * self.viscosity * self.hydrodynamic_radius.powi(3))
    }

    /// Length of a translational vector for this particle count, `3N`.
    pub fn vector_len(&self) -> usize {
        3 * self.number_particles
    }
}

fn out_of_range(name: &'static str, value: f64, expected: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        name,
        value,
        expected,
    }
}
