//! All-pairs Rotne-Prager-Yamakawa mobility, optionally above a wall.
//!
//! Every particle interacts with every other particle in its batch.
//! Batches let one solver evaluate several independent systems of the
//! same size at once: particles `[b·n, (b+1)·n)` form batch `b`.
//!
//! With periodicity `(open, open, single_wall)` a no-slip wall sits at
//! `z = 0` and the Swan-Brady image correction is added to every block.
//! Heights below one radius are clamped to `a` in the wall terms.

use std::f64::consts::PI;

use log::debug;
use smallvec::smallvec;
use stokes_core::{
    ConfigError, MobilityError, OptionKind, OptionSpec, OptionValue, Parameters, Periodicity,
    PeriodicitySet, Scalar, SolverOptions,
};
use stokes_solver::{check_geometry, Backend};

use crate::rpy;

/// Options accepted by [`NBody`].
///
/// Both batch sizes are optional. Unset sizes default to a single batch
/// holding every particle; if only one is set the other is derived.
///
/// # Examples
///
/// ```
/// use stokes_core::SolverOptions;
/// use stokes_solvers::NBodyOptions;
///
/// let mut opts = NBodyOptions::default();
/// opts.set("n_batch", 4.into()).unwrap();
/// assert_eq!(opts.n_batch, Some(4));
/// assert!(opts.set("algorithm", "fast".into()).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NBodyOptions {
    /// Number of independent batches.
    pub n_batch: Option<i64>,
    /// Particles per batch.
    pub n_per_batch: Option<i64>,
}

impl NBodyOptions {
    /// `n_batch` batches of `n_per_batch` particles each.
    pub fn batched(n_batch: usize, n_per_batch: usize) -> Self {
        Self {
            n_batch: Some(n_batch as i64),
            n_per_batch: Some(n_per_batch as i64),
        }
    }

    /// Resolve the batch layout for `number_particles`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] for sizes below 1 and
    /// [`ConfigError::BatchLayout`] if the sizes do not tile the particles.
    pub fn layout(&self, number_particles: usize) -> Result<(usize, usize), ConfigError> {
        let n_batch = positive(self.n_batch, "n_batch")?;
        let n_per_batch = positive(self.n_per_batch, "n_per_batch")?;
        let mismatch = |n_batch: usize, n_per_batch: usize| ConfigError::BatchLayout {
            n_batch,
            n_per_batch,
            number_particles,
        };
        match (n_batch, n_per_batch) {
            (None, None) => Ok((1, number_particles)),
            (Some(b), None) if number_particles % b == 0 => Ok((b, number_particles / b)),
            (None, Some(p)) if number_particles % p == 0 => Ok((number_particles / p, p)),
            (Some(b), Some(p)) if b.checked_mul(p) == Some(number_particles) => Ok((b, p)),
            (b, p) => Err(mismatch(
                b.unwrap_or(0),
                p.unwrap_or(0),
            )),
        }
    }
}

fn positive(value: Option<i64>, name: &'static str) -> Result<Option<usize>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) if v >= 1 => Ok(Some(v as usize)),
        Some(v) => Err(ConfigError::OutOfRange {
            name,
            value: v as f64,
            expected: "integer >= 1",
        }),
    }
}

impl SolverOptions for NBodyOptions {
    const SOLVER: &'static str = "NBody";

    fn specs() -> &'static [OptionSpec] {
        &[
            OptionSpec {
                name: "n_batch",
                kind: OptionKind::Integer,
                required: false,
                description: "number of independent batches, >= 1",
            },
            OptionSpec {
                name: "n_per_batch",
                kind: OptionKind::Integer,
                required: false,
                description: "particles per batch, >= 1",
            },
        ]
    }

    fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
        let spec = Self::spec(name)?;
        let v = value.as_integer(spec.name)?;
        match spec.name {
            "n_batch" => self.n_batch = Some(v),
            _ => self.n_per_batch = Some(v),
        }
        Ok(())
    }
}

/// Pair kernel selected by the periodicity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    /// Free-space RPY.
    OpenRpy,
    /// RPY plus the image system of a no-slip wall at `z = 0`.
    BottomWall,
}

/// All-pairs RPY backend.
#[derive(Debug)]
pub struct NBody {
    kernel: Kernel,
    radius: f64,
    prefactor: f64,
    n_batch: usize,
    n_per_batch: usize,
}

impl NBody {
    /// The kernel chosen at construction.
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Resolved `(n_batch, n_per_batch)`.
    pub fn layout(&self) -> (usize, usize) {
        (self.n_batch, self.n_per_batch)
    }

    fn block<T: Scalar>(&self, pi: [T; 3], pj: [T; 3], inv_a: T) -> rpy::Block<T> {
        let r = [
            (pi[0] - pj[0]) * inv_a,
            (pi[1] - pj[1]) * inv_a,
            (pi[2] - pj[2]) * inv_a,
        ];
        let mut m = rpy::open(r);
        if self.kernel == Kernel::BottomWall {
            let hi = (pi[2] * inv_a).max(T::one());
            let hj = (pj[2] * inv_a).max(T::one());
            let w = rpy::wall_correction(r, hi, hj);
            for (row, wrow) in m.iter_mut().zip(&w) {
                for (v, dv) in row.iter_mut().zip(wrow) {
                    *v += *dv;
                }
            }
        }
        m
    }
}

fn particle<T: Scalar>(positions: &[T], i: usize) -> [T; 3] {
    [positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]]
}

impl<T: Scalar> Backend<T> for NBody {
    type Options = NBodyOptions;
    const NAME: &'static str = "NBody";

    fn supported_periodicities() -> PeriodicitySet {
        smallvec![Periodicity::open(), Periodicity::bottom_wall()]
    }

    fn new(periodicity: Periodicity) -> Result<Self, MobilityError> {
        check_geometry::<T, Self>(periodicity)?;
        let kernel = if periodicity == Periodicity::bottom_wall() {
            Kernel::BottomWall
        } else {
            Kernel::OpenRpy
        };
        Ok(Self {
            kernel,
            radius: 0.0,
            prefactor: 0.0,
            n_batch: 0,
            n_per_batch: 0,
        })
    }

    fn initialize(&mut self, params: &Parameters, options: &NBodyOptions) -> Result<(), ConfigError> {
        let (n_batch, n_per_batch) = options.layout(params.number_particles)?;
        self.n_batch = n_batch;
        self.n_per_batch = n_per_batch;
        self.radius = params.hydrodynamic_radius;
        self.prefactor = 1.0 / (8.0 * PI * params.viscosity * params.hydrodynamic_radius);
        debug!(
            "NBody: {:?} kernel, {n_batch} batches of {n_per_batch} particles",
            self.kernel
        );
        Ok(())
    }

    fn mdot(
        &self,
        positions: &[T],
        forces: &[T],
        _torques: Option<&[T]>,
        linear: &mut [T],
        _angular: Option<&mut [T]>,
    ) {
        let inv_a = T::from_real(self.radius.recip());
        let prefactor = T::from_real(self.prefactor);
        for batch in 0..self.n_batch {
            let range = batch * self.n_per_batch..(batch + 1) * self.n_per_batch;
            for i in range.clone() {
                let pi = particle(positions, i);
                let mut acc = [T::zero(); 3];
                for j in range.clone() {
                    let m = self.block(pi, particle(positions, j), inv_a);
                    rpy::accumulate(&mut acc, &m, &forces[3 * j..3 * j + 3]);
                }
                for (k, v) in acc.into_iter().enumerate() {
                    linear[3 * i + k] = prefactor * v;
                }
            }
        }
    }
}
