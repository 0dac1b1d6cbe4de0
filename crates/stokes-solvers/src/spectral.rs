//! Triply periodic RPY mobility as a truncated reciprocal-lattice sum.
//!
//! In Fourier space the RPY tensor is `sinc²(k a) (I − k̂k̂) / (η k²)`.
//! The periodic mobility sums it over the reciprocal lattice of the
//! (possibly sheared) box, excluding `k = 0`:
//!
//! ```text
//! M_ij = Σ_{0 < |k| ≤ K} sinc²(k a) (I − k̂k̂) cos(k · r_ij) / (η V k²)
//!      + δ_ij Φ(K a) / (3 π² η a) I
//! ```
//!
//! where `Φ(x) = ∫_x^∞ sin²t / t² dt` replaces the modes beyond the cutoff
//! by their continuum limit. Only one of each `±k` pair is stored, with
//! doubled weight.
//!
//! The shear strain `γ` tilts the box: lattice vectors are `(Lx, 0, 0)`,
//! `(γ Ly, Ly, 0)` and `(0, 0, Lz)`.
//!
//! Modes, phases and sums are kept in `f64` whatever the solver
//! precision; results are rounded once on output. The number of modes
//! grows as `V (K/a)³`, so boxes whose estimate exceeds [`MAX_MODES`] are
//! rejected at `initialize`.

use std::f64::consts::{PI, TAU};

use log::debug;
use smallvec::smallvec;
use stokes_core::{
    ConfigError, MobilityError, OptionKind, OptionSpec, OptionValue, Parameters, Periodicity,
    PeriodicitySet, Scalar, SolverOptions,
};
use stokes_solver::{check_geometry, Backend, FluctuationContext};

use crate::special::{sinc, sinc_squared_tail};

/// Default `K·a`.
pub const DEFAULT_CUTOFF: f64 = 8.0;

/// Accepted range of `K·a`.
pub const CUTOFF_RANGE: (f64, f64) = (4.0, 64.0);

/// Largest accepted estimate of the stored mode count.
pub const MAX_MODES: usize = 1 << 22;

/// Stored modes (one per `±k` pair) for a box of `volume` and cutoff
/// `k_max`: half the lattice points inside the sphere of radius `k_max`.
pub(crate) fn estimated_modes(volume: f64, k_max: f64) -> f64 {
    volume * k_max.powi(3) / (12.0 * PI * PI)
}

pub(crate) fn check_mode_budget(volume: f64, k_max: f64) -> Result<(), ConfigError> {
    let estimate = estimated_modes(volume, k_max);
    if estimate.is_finite() && estimate <= MAX_MODES as f64 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name: "mode_count",
            value: estimate,
            expected: "at most 4194304 modes, V·(K/a)³/(12π²)",
        })
    }
}

pub(crate) fn check_cutoff(cutoff: f64) -> Result<(), ConfigError> {
    let (lo, hi) = CUTOFF_RANGE;
    if (lo..=hi).contains(&cutoff) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name: "wavenumber_cutoff",
            value: cutoff,
            expected: "in [4, 64]",
        })
    }
}

/// A box edge: required, finite and positive.
pub(crate) fn box_edge(
    solver: &'static str,
    value: Option<f64>,
    name: &'static str,
) -> Result<f64, ConfigError> {
    match value {
        None => Err(ConfigError::MissingParameter { solver, name }),
        Some(l) if l.is_finite() && l > 0.0 => Ok(l),
        Some(l) => Err(ConfigError::OutOfRange {
            name,
            value: l,
            expected: "finite, > 0",
        }),
    }
}

/// Options accepted by [`SpectralRpy`].
///
/// The box edges have no default and must be set before `initialize`.
///
/// # Examples
///
/// ```
/// use stokes_core::SolverOptions;
/// use stokes_solvers::SpectralRpyOptions;
///
/// let opts = SpectralRpyOptions::cubic(32.0).with_cutoff(12.0);
/// assert_eq!(opts.ly, Some(32.0));
///
/// let mut named = SpectralRpyOptions::default();
/// named.set("lx", 32.0.into()).unwrap();
/// assert!(named.set("lx", 32.into()).is_ok());
/// assert!(named.set("lx", "wide".into()).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralRpyOptions {
    /// Box edge along x.
    pub lx: Option<f64>,
    /// Box edge along y.
    pub ly: Option<f64>,
    /// Box edge along z.
    pub lz: Option<f64>,
    /// Shear strain of the box in the x-y plane.
    pub shear_strain: f64,
    /// Wavenumber cutoff in units of `1/a`.
    pub wavenumber_cutoff: f64,
}

impl Default for SpectralRpyOptions {
    fn default() -> Self {
        Self {
            lx: None,
            ly: None,
            lz: None,
            shear_strain: 0.0,
            wavenumber_cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl SpectralRpyOptions {
    /// A cubic box of edge `l`.
    pub fn cubic(l: f64) -> Self {
        Self::default().with_box(l, l, l)
    }

    /// Set all three box edges.
    pub fn with_box(mut self, lx: f64, ly: f64, lz: f64) -> Self {
        self.lx = Some(lx);
        self.ly = Some(ly);
        self.lz = Some(lz);
        self
    }

    /// Set the shear strain.
    pub fn with_shear_strain(mut self, strain: f64) -> Self {
        self.shear_strain = strain;
        self
    }

    /// Set `K·a`.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.wavenumber_cutoff = cutoff;
        self
    }

    /// Validate against a particle radius and return the lattice.
    fn resolve(&self, radius: f64) -> Result<Lattice, ConfigError> {
        let lattice = Lattice {
            lx: box_edge(Self::SOLVER, self.lx, "lx")?,
            ly: box_edge(Self::SOLVER, self.ly, "ly")?,
            lz: box_edge(Self::SOLVER, self.lz, "lz")?,
            strain: self.shear_strain,
        };
        if !self.shear_strain.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "shear_strain",
                value: self.shear_strain,
                expected: "finite",
            });
        }
        check_cutoff(self.wavenumber_cutoff)?;
        check_mode_budget(lattice.volume(), self.wavenumber_cutoff / radius)?;
        Ok(lattice)
    }
}

impl SolverOptions for SpectralRpyOptions {
    const SOLVER: &'static str = "SpectralRpy";

    fn specs() -> &'static [OptionSpec] {
        &[
            OptionSpec {
                name: "lx",
                kind: OptionKind::Real,
                required: true,
                description: "box edge along x, > 0; lx·ly·lz·(K/a)³/(12π²) at most 4194304",
            },
            OptionSpec {
                name: "ly",
                kind: OptionKind::Real,
                required: true,
                description: "box edge along y, > 0",
            },
            OptionSpec {
                name: "lz",
                kind: OptionKind::Real,
                required: true,
                description: "box edge along z, > 0",
            },
            OptionSpec {
                name: "shear_strain",
                kind: OptionKind::Real,
                required: false,
                description: "x-y shear strain of the box, default 0",
            },
            OptionSpec {
                name: "wavenumber_cutoff",
                kind: OptionKind::Real,
                required: false,
                description: "K·a, in [4, 64], default 8",
            },
        ]
    }

    fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
        let spec = Self::spec(name)?;
        let v = value.as_real(spec.name)?;
        match spec.name {
            "lx" => self.lx = Some(v),
            "ly" => self.ly = Some(v),
            "lz" => self.lz = Some(v),
            "shear_strain" => self.shear_strain = v,
            _ => self.wavenumber_cutoff = v,
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Lattice {
    pub(crate) lx: f64,
    pub(crate) ly: f64,
    pub(crate) lz: f64,
    pub(crate) strain: f64,
}

impl Lattice {
    pub(crate) fn volume(&self) -> f64 {
        self.lx * self.ly * self.lz
    }
}

/// `n1 > 0`, else `n2 > 0`, else `n3 > 0`: one representative of `±n`.
fn half_space(n1: i64, n2: i64, n3: i64) -> bool {
    n1 > 0 || (n1 == 0 && (n2 > 0 || (n2 == 0 && n3 > 0)))
}

/// Wavevectors with `0 < |k| ≤ k_max`, one per `±k` pair, as
/// `(k, |k|²)`.
pub(crate) fn reciprocal_lattice(lattice: &Lattice, k_max: f64) -> Vec<([f64; 3], f64)> {
    let reach = k_max / TAU;
    let n1_max = (reach * lattice.lx).floor() as i64;
    let n3_max = (reach * lattice.lz).floor() as i64;
    let mut out = Vec::new();
    for n1 in 0..=n1_max {
        let kx = TAU * n1 as f64 / lattice.lx;
        let centre = lattice.strain * n1 as f64 / lattice.lx;
        let n2_lo = (lattice.ly * (centre - reach)).ceil() as i64;
        let n2_hi = (lattice.ly * (centre + reach)).floor() as i64;
        for n2 in n2_lo..=n2_hi {
            let ky = TAU * (n2 as f64 / lattice.ly - centre);
            for n3 in -n3_max..=n3_max {
                if !half_space(n1, n2, n3) {
                    continue;
                }
                let kz = TAU * n3 as f64 / lattice.lz;
                let k2 = kx * kx + ky * ky + kz * kz;
                if k2 <= k_max * k_max {
                    out.push(([kx, ky, kz], k2));
                }
            }
        }
    }
    out
}

#[derive(Clone, Copy, Debug)]
struct Mode {
    k: [f64; 3],
    inv_k2: f64,
    weight: f64,
    amplitude: f64,
}

impl Mode {
    /// `(I − k̂k̂) v`.
    fn project(&self, v: [f64; 3]) -> [f64; 3] {
        let d = (self.k[0] * v[0] + self.k[1] * v[1] + self.k[2] * v[2]) * self.inv_k2;
        [v[0] - self.k[0] * d, v[1] - self.k[1] * d, v[2] - self.k[2] * d]
    }

    fn phase(&self, p: &[f64]) -> (f64, f64) {
        (self.k[0] * p[0] + self.k[1] * p[1] + self.k[2] * p[2]).sin_cos()
    }
}

/// RPY Fourier modes of one lattice plus the continuum tail.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModeSet {
    modes: Vec<Mode>,
    tail: f64,
}

impl ModeSet {
    /// Modes of `lattice` below `K·a = cutoff` that `keep` accepts.
    pub(crate) fn build(
        lattice: &Lattice,
        params: &Parameters,
        cutoff: f64,
        keep: impl Fn(&[f64; 3]) -> bool,
    ) -> Self {
        let a = params.hydrodynamic_radius;
        let eta = params.viscosity;
        let norm = 2.0 / (eta * lattice.volume());
        let modes = reciprocal_lattice(lattice, cutoff / a)
            .into_iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, k2)| {
                let s = sinc(k2.sqrt() * a);
                let weight = norm * s * s / k2;
                Mode {
                    k,
                    inv_k2: k2.recip(),
                    weight,
                    amplitude: weight.sqrt(),
                }
            })
            .collect();
        Self {
            modes,
            tail: sinc_squared_tail(cutoff) / (3.0 * PI * PI * eta * a),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.modes.len()
    }

    pub(crate) fn tail(&self) -> f64 {
        self.tail
    }

    /// `out += M·F`.
    pub(crate) fn apply(&self, positions: &[f64], forces: &[f64], out: &mut [f64]) {
        let n = positions.len() / 3;
        let mut phases = vec![(0.0, 0.0); n];
        for mode in &self.modes {
            let mut cf = [0.0; 3];
            let mut sf = [0.0; 3];
            for ((slot, p), f) in phases
                .iter_mut()
                .zip(positions.chunks_exact(3))
                .zip(forces.chunks_exact(3))
            {
                *slot = mode.phase(p);
                let (s, c) = *slot;
                for d in 0..3 {
                    cf[d] += c * f[d];
                    sf[d] += s * f[d];
                }
            }
            let pc = mode.project(cf).map(|v| v * mode.weight);
            let ps = mode.project(sf).map(|v| v * mode.weight);
            for (&(s, c), u) in phases.iter().zip(out.chunks_exact_mut(3)) {
                for d in 0..3 {
                    u[d] += c * pc[d] + s * ps[d];
                }
            }
        }
        for (u, f) in out.iter_mut().zip(forces) {
            *u += self.tail * f;
        }
    }

    /// `out += sqrt(M)·z`: each mode gets two independent projected
    /// Gaussian vectors, the tail an independent diagonal draw.
    pub(crate) fn sample<T: Scalar>(
        &self,
        positions: &[f64],
        ctx: &mut FluctuationContext<'_, T>,
        out: &mut [f64],
    ) {
        let s = self.tail.sqrt();
        for v in out.iter_mut() {
            *v += s * ctx.normal();
        }
        for mode in &self.modes {
            let mut draw = || [(); 3].map(|_| ctx.normal());
            let a = mode.project(draw()).map(|v| v * mode.amplitude);
            let b = mode.project(draw()).map(|v| v * mode.amplitude);
            for (p, u) in positions.chunks_exact(3).zip(out.chunks_exact_mut(3)) {
                let (s, c) = mode.phase(p);
                for d in 0..3 {
                    u[d] += c * a[d] + s * b[d];
                }
            }
        }
    }
}

/// Copy into `f64`.
pub(crate) fn widen<T: Scalar>(values: &[T]) -> Vec<f64> {
    values.iter().map(|v| v.to_real()).collect()
}

/// Round `wide` into `out`.
pub(crate) fn store<T: Scalar>(wide: &[f64], out: &mut [T]) {
    for (o, &w) in out.iter_mut().zip(wide) {
        *o = T::from_real(w);
    }
}

/// Spectral RPY backend for `(periodic, periodic, periodic)`.
#[derive(Debug)]
pub struct SpectralRpy {
    modes: ModeSet,
}

impl SpectralRpy {
    /// Number of stored wavevectors (one per `±k` pair).
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Continuum correction added to every self block.
    pub fn tail(&self) -> f64 {
        self.modes.tail()
    }
}

impl<T: Scalar> Backend<T> for SpectralRpy {
    type Options = SpectralRpyOptions;
    const NAME: &'static str = "SpectralRpy";

    fn supported_periodicities() -> PeriodicitySet {
        smallvec![Periodicity::triply_periodic()]
    }

    fn new(periodicity: Periodicity) -> Result<Self, MobilityError> {
        check_geometry::<T, Self>(periodicity)?;
        Ok(Self {
            modes: ModeSet::default(),
        })
    }

    fn initialize(
        &mut self,
        params: &Parameters,
        options: &SpectralRpyOptions,
    ) -> Result<(), ConfigError> {
        let lattice = options.resolve(params.hydrodynamic_radius)?;
        self.modes = ModeSet::build(&lattice, params, options.wavenumber_cutoff, |_| true);
        debug!(
            "SpectralRpy: {} modes below K·a = {}, box {}×{}×{}, strain {}",
            self.modes.len(),
            options.wavenumber_cutoff,
            lattice.lx,
            lattice.ly,
            lattice.lz,
            lattice.strain
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
        let mut out = vec![0.0; linear.len()];
        self.modes.apply(&widen(positions), &widen(forces), &mut out);
        store(&out, linear);
    }

    fn sqrt_mdot_w(
        &self,
        positions: &[T],
        ctx: &mut FluctuationContext<'_, T>,
        linear: &mut [T],
        _angular: Option<&mut [T]>,
    ) {
        let mut out = vec![0.0; linear.len()];
        self.modes.sample(&widen(positions), ctx, &mut out);
        store(&out, linear);
    }

    fn clean(&mut self) {
        self.modes = ModeSet::default();
    }
}
