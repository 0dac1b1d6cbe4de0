//! Doubly periodic RPY mobility: periodic along x and y, either unbounded
//! along z or above a no-slip wall at `z = 0`.
//!
//! With open z, modes with a non-zero in-plane wavevector are summed on
//! the lattice of the cell padded along z to `Lp = H + 4 max(Lx, Ly)`,
//! where `H = zmax − zmin + 2a`. Their images along z fall off as
//! `exp(−2π Lp / max(Lx, Ly))`. The zero in-plane wavevector is the flow
//! of a uniformly forced sheet and is added exactly:
//!
//! ```text
//! M⁰_ij = (H − f(ζ_i − ζ_j)) / (2 η Lx Ly)    on x and y
//! f(d)  = |d| + (2a − |d|)³ / (12 a²)        for |d| < 2a, else |d|
//! ```
//!
//! with `ζ` the height clamped to `[zmin, zmax]`. The sheet flow is only
//! fixed up to a uniform translation; the constant `H` keeps `M⁰`
//! positive semidefinite.
//!
//! Above a wall, the Swan-Brady blocks of [`crate::rpy`] are summed over
//! in-plane images under a smooth window of reach `R = 6 max(Lx, Ly)`.
//! What the window cuts away is restored in the continuum limit: its own
//! integral of the block over the plane is subtracted and the exact one,
//! the Couette flow `4π (h_i + h_j − f(h_i − h_j))` along x and y and
//! nothing along z, is added, both per unit cell area. Heights below one
//! radius are clamped to `a` in every term.
//!
//! Both geometries compute in `f64` and draw noise with Lanczos.

use std::f64::consts::{PI, TAU};

use log::debug;
use smallvec::smallvec;
use stokes_core::{
    ConfigError, MobilityError, OptionKind, OptionSpec, OptionValue, Parameters, Periodicity,
    PeriodicitySet, Scalar, SolverOptions,
};
use stokes_solver::{check_geometry, Backend};

use crate::rpy::{self, Block};
use crate::spectral::{
    box_edge, check_cutoff, check_mode_budget, store, widen, Lattice, ModeSet, DEFAULT_CUTOFF,
};

/// Padding of the z period, in units of the larger in-plane edge.
pub const PADDING: f64 = 4.0;

/// Reach of the image window, in units of the larger in-plane edge.
pub const IMAGE_REACH: f64 = 6.0;

/// Options accepted by [`DoublyPeriodicRpy`].
///
/// The in-plane edges are always required. The height range is required
/// for open z and ignored above a wall.
///
/// # Examples
///
/// ```
/// use stokes_core::SolverOptions;
/// use stokes_solvers::DoublyPeriodicRpyOptions;
///
/// let opts = DoublyPeriodicRpyOptions::square(16.0).with_heights(-4.0, 4.0);
/// assert_eq!(opts.zmax, Some(4.0));
///
/// let mut named = DoublyPeriodicRpyOptions::default();
/// named.set("zmin", (-2).into()).unwrap();
/// assert_eq!(named.zmin, Some(-2.0));
/// assert!(named.set("lz", 8.0.into()).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DoublyPeriodicRpyOptions {
    /// Cell edge along x.
    pub lx: Option<f64>,
    /// Cell edge along y.
    pub ly: Option<f64>,
    /// Lowest expected particle height.
    pub zmin: Option<f64>,
    /// Highest expected particle height.
    pub zmax: Option<f64>,
    /// Wavenumber cutoff in units of `1/a`.
    pub wavenumber_cutoff: f64,
}

impl Default for DoublyPeriodicRpyOptions {
    fn default() -> Self {
        Self {
            lx: None,
            ly: None,
            zmin: None,
            zmax: None,
            wavenumber_cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl DoublyPeriodicRpyOptions {
    /// A square cell of edge `l`.
    pub fn square(l: f64) -> Self {
        Self::default().with_cell(l, l)
    }

    /// Set both in-plane edges.
    pub fn with_cell(mut self, lx: f64, ly: f64) -> Self {
        self.lx = Some(lx);
        self.ly = Some(ly);
        self
    }

    /// Set the height range.
    pub fn with_heights(mut self, zmin: f64, zmax: f64) -> Self {
        self.zmin = Some(zmin);
        self.zmax = Some(zmax);
        self
    }

    /// Set `K·a`.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.wavenumber_cutoff = cutoff;
        self
    }

    fn cell(&self) -> Result<[f64; 2], ConfigError> {
        Ok([
            box_edge(Self::SOLVER, self.lx, "lx")?,
            box_edge(Self::SOLVER, self.ly, "ly")?,
        ])
    }

    fn heights(&self) -> Result<[f64; 2], ConfigError> {
        let missing = |name| ConfigError::MissingParameter {
            solver: Self::SOLVER,
            name,
        };
        let zmin = self.zmin.ok_or_else(|| missing("zmin"))?;
        let zmax = self.zmax.ok_or_else(|| missing("zmax"))?;
        if !zmin.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "zmin",
                value: zmin,
                expected: "finite",
            });
        }
        if !(zmax.is_finite() && zmax > zmin) {
            return Err(ConfigError::OutOfRange {
                name: "zmax",
                value: zmax,
                expected: "finite, > zmin",
            });
        }
        Ok([zmin, zmax])
    }
}

impl SolverOptions for DoublyPeriodicRpyOptions {
    const SOLVER: &'static str = "DoublyPeriodicRpy";

    fn specs() -> &'static [OptionSpec] {
        &[
            OptionSpec {
                name: "lx",
                kind: OptionKind::Real,
                required: true,
                description: "cell edge along x, > 0; with open z lx·ly·Lp·(K/a)³/(12π²) at most 4194304",
            },
            OptionSpec {
                name: "ly",
                kind: OptionKind::Real,
                required: true,
                description: "cell edge along y, > 0",
            },
            OptionSpec {
                name: "zmin",
                kind: OptionKind::Real,
                required: false,
                description: "lowest particle height; required when z is open",
            },
            OptionSpec {
                name: "zmax",
                kind: OptionKind::Real,
                required: false,
                description: "highest particle height, > zmin; required when z is open",
            },
            OptionSpec {
                name: "wavenumber_cutoff",
                kind: OptionKind::Real,
                required: false,
                description: "K·a for open z, in [4, 64], default 8",
            },
        ]
    }

    fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
        let spec = Self::spec(name)?;
        let v = value.as_real(spec.name)?;
        match spec.name {
            "lx" => self.lx = Some(v),
            "ly" => self.ly = Some(v),
            "zmin" => self.zmin = Some(v),
            "zmax" => self.zmax = Some(v),
            _ => self.wavenumber_cutoff = v,
        }
        Ok(())
    }
}

/// Boundary along z, chosen by the periodicity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confinement {
    /// Unbounded fluid above and below.
    Open,
    /// No-slip wall at `z = 0`.
    BottomWall,
}

/// Doubly periodic RPY backend.
#[derive(Debug)]
pub struct DoublyPeriodicRpy {
    confinement: Confinement,
    cell: [f64; 2],
    radius: f64,
    viscosity: f64,
    heights: [f64; 2],
    padded: f64,
    modes: ModeSet,
}

impl DoublyPeriodicRpy {
    /// The boundary chosen at construction.
    pub fn confinement(&self) -> Confinement {
        self.confinement
    }

    /// Stored wavevectors; zero above a wall.
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Period `Lp` of the padded lattice along z; zero above a wall.
    pub fn padded_height(&self) -> f64 {
        self.padded
    }

    fn open_mdot(&self, positions: &[f64], forces: &[f64], out: &mut [f64]) {
        self.modes.apply(positions, forces, out);
        let [zmin, zmax] = self.heights;
        let diameter = 2.0 * self.radius;
        let height = zmax - zmin + diameter;
        let scale = 1.0 / (2.0 * self.viscosity * self.cell[0] * self.cell[1]);
        let zeta: Vec<f64> = positions
            .chunks_exact(3)
            .map(|p| p[2].clamp(zmin, zmax))
            .collect();
        for (&zi, u) in zeta.iter().zip(out.chunks_exact_mut(3)) {
            let mut acc = [0.0; 2];
            for (&zj, f) in zeta.iter().zip(forces.chunks_exact(3)) {
                let c = scale * (height - smoothed_distance(zi - zj, diameter));
                acc[0] += c * f[0];
                acc[1] += c * f[1];
            }
            u[0] += acc[0];
            u[1] += acc[1];
        }
    }

    fn wall_mdot(&self, positions: &[f64], forces: &[f64], out: &mut [f64]) {
        let inv_a = self.radius.recip();
        let n = positions.len() / 3;
        let mut acc = vec![[0.0; 3]; n];
        for i in 0..n {
            let pi = particle(positions, i);
            for j in i..n {
                let m = self.wall_block(pi, particle(positions, j), inv_a);
                rpy::accumulate(&mut acc[i], &m, &forces[3 * j..3 * j + 3]);
                if j != i {
                    rpy::accumulate(&mut acc[j], &transpose(&m), &forces[3 * i..3 * i + 3]);
                }
            }
        }
        let prefactor = 1.0 / (8.0 * PI * self.viscosity * self.radius);
        for (u, v) in out.chunks_exact_mut(3).zip(&acc) {
            for d in 0..3 {
                u[d] = prefactor * v[d];
            }
        }
    }

    /// Dimensionless block between `pi` and every image of `pj`.
    fn wall_block(&self, pi: [f64; 3], pj: [f64; 3], inv_a: f64) -> Block<f64> {
        let lx = self.cell[0] * inv_a;
        let ly = self.cell[1] * inv_a;
        let reach = IMAGE_REACH * lx.max(ly);
        let hi = (pi[2] * inv_a).max(1.0);
        let hj = (pj[2] * inv_a).max(1.0);
        let dx = wrap((pi[0] - pj[0]) * inv_a, lx);
        let dy = wrap((pi[1] - pj[1]) * inv_a, ly);
        let dz = hi - hj;

        let mut m = [[0.0; 3]; 3];
        let n1 = (reach / lx + 1.0).ceil() as i64;
        let n2 = (reach / ly + 1.0).ceil() as i64;
        for a1 in -n1..=n1 {
            let x = dx + a1 as f64 * lx;
            for a2 in -n2..=n2 {
                let y = dy + a2 as f64 * ly;
                let w = window((x * x + y * y).sqrt() / reach);
                if w == 0.0 {
                    continue;
                }
                let b = wall_kernel([x, y, dz], hi, hj);
                for (row, brow) in m.iter_mut().zip(&b) {
                    for (v, bv) in row.iter_mut().zip(brow) {
                        *v += w * bv;
                    }
                }
            }
        }

        let (parallel, normal) = windowed_plane_integral(hi, hj, reach);
        let area = lx * ly;
        let couette = 2.0 * TAU * (hi + hj - smoothed_distance(dz, 2.0));
        m[0][0] += (couette - parallel) / area;
        m[1][1] += (couette - parallel) / area;
        m[2][2] -= normal / area;
        m
    }
}

fn particle(positions: &[f64], i: usize) -> [f64; 3] {
    [positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]]
}

fn transpose(m: &Block<f64>) -> Block<f64> {
    [0, 1, 2].map(|i| [m[0][i], m[1][i], m[2][i]])
}

/// Nearest image of the separation `d` in a period `l`.
fn wrap(d: f64, l: f64) -> f64 {
    d - l * (d / l).round()
}

/// `|d|`, smoothed over one `diameter` the way RPY smooths overlaps.
fn smoothed_distance(d: f64, diameter: f64) -> f64 {
    let d = d.abs();
    if d < diameter {
        d + (diameter - d).powi(3) / (3.0 * diameter * diameter)
    } else {
        d
    }
}

/// 1 up to `s = 1/2`, a `cos²` ramp to 0 at `s = 1`.
fn window(s: f64) -> f64 {
    if s <= 0.5 {
        1.0
    } else if s < 1.0 {
        let c = (PI * (s - 0.5)).cos();
        c * c
    } else {
        0.0
    }
}

fn wall_kernel(r: [f64; 3], hi: f64, hj: f64) -> Block<f64> {
    let mut m = rpy::open(r);
    let w = rpy::wall_correction(r, hi, hj);
    for (row, wrow) in m.iter_mut().zip(&w) {
        for (v, dv) in row.iter_mut().zip(wrow) {
            *v += dv;
        }
    }
    m
}

/// Eight-point Gauss-Legendre rule on `[-1, 1]`, positive nodes only.
const GAUSS_LEGENDRE: [(f64, f64); 4] = [
    (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
];

/// Panel edges on `[0, reach]`: the RPY overlap kink, doubling panels
/// out to `reach / 2`, then four equal panels across the window ramp.
fn panel_edges(dz: f64, reach: f64) -> Vec<f64> {
    let half = 0.5 * reach;
    let mut edges = vec![0.0];
    if dz.abs() < 2.0 {
        edges.push((4.0 - dz * dz).sqrt());
    }
    let mut s = edges[edges.len() - 1].max(1.0);
    while s < half {
        s = (2.0 * s).min(half);
        if s > edges[edges.len() - 1] {
            edges.push(s);
        }
    }
    edges.retain(|&e| e < half);
    edges.extend((0..=4).map(|k| half + k as f64 * reach / 8.0));
    edges
}

/// `∫ w(ρ/R) B d²ρ` over the plane, as `(xx, zz)`; `yy` equals `xx` and
/// the off-diagonal entries vanish by symmetry.
fn windowed_plane_integral(hi: f64, hj: f64, reach: f64) -> (f64, f64) {
    let dz = hi - hj;
    let mut parallel = 0.0;
    let mut normal = 0.0;
    for panel in panel_edges(dz, reach).windows(2) {
        let mid = 0.5 * (panel[0] + panel[1]);
        let half = 0.5 * (panel[1] - panel[0]);
        for &(node, weight) in &GAUSS_LEGENDRE {
            for rho in [mid - half * node, mid + half * node] {
                let b = wall_kernel([rho, 0.0, dz], hi, hj);
                let w = weight * half * window(rho / reach) * rho;
                parallel += w * PI * (b[0][0] + b[1][1]);
                normal += w * TAU * b[2][2];
            }
        }
    }
    (parallel, normal)
}

impl<T: Scalar> Backend<T> for DoublyPeriodicRpy {
    type Options = DoublyPeriodicRpyOptions;
    const NAME: &'static str = "DoublyPeriodicRpy";

    fn supported_periodicities() -> PeriodicitySet {
        smallvec![
            Periodicity::doubly_periodic(),
            Periodicity::doubly_periodic_wall()
        ]
    }

    fn new(periodicity: Periodicity) -> Result<Self, MobilityError> {
        check_geometry::<T, Self>(periodicity)?;
        let confinement = if periodicity == Periodicity::doubly_periodic_wall() {
            Confinement::BottomWall
        } else {
            Confinement::Open
        };
        Ok(Self {
            confinement,
            cell: [0.0; 2],
            radius: 0.0,
            viscosity: 0.0,
            heights: [0.0; 2],
            padded: 0.0,
            modes: ModeSet::default(),
        })
    }

    fn initialize(
        &mut self,
        params: &Parameters,
        options: &DoublyPeriodicRpyOptions,
    ) -> Result<(), ConfigError> {
        let cell = options.cell()?;
        let a = params.hydrodynamic_radius;
        match self.confinement {
            Confinement::Open => {
                let heights = options.heights()?;
                let cutoff = options.wavenumber_cutoff;
                check_cutoff(cutoff)?;
                let padded = heights[1] - heights[0] + 2.0 * a + PADDING * cell[0].max(cell[1]);
                let lattice = Lattice {
                    lx: cell[0],
                    ly: cell[1],
                    lz: padded,
                    strain: 0.0,
                };
                check_mode_budget(lattice.volume(), cutoff / a)?;
                self.modes = ModeSet::build(&lattice, params, cutoff, |k| k[0] != 0.0 || k[1] != 0.0);
                self.heights = heights;
                self.padded = padded;
                debug!(
                    "DoublyPeriodicRpy: {} modes below K·a = {cutoff}, cell {}×{}, padded height {padded}",
                    self.modes.len(),
                    cell[0],
                    cell[1]
                );
            }
            Confinement::BottomWall => {
                self.modes = ModeSet::default();
                self.padded = 0.0;
                debug!(
                    "DoublyPeriodicRpy: wall images within {} of each particle, cell {}×{}",
                    IMAGE_REACH * cell[0].max(cell[1]),
                    cell[0],
                    cell[1]
                );
            }
        }
        self.cell = cell;
        self.radius = a;
        self.viscosity = params.viscosity;
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
        let positions = widen(positions);
        let forces = widen(forces);
        let mut out = vec![0.0; linear.len()];
        match self.confinement {
            Confinement::Open => self.open_mdot(&positions, &forces, &mut out),
            Confinement::BottomWall => self.wall_mdot(&positions, &forces, &mut out),
        }
        store(&out, linear);
    }

    fn clean(&mut self) {
        self.modes = ModeSet::default();
    }
}
