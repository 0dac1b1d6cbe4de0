//! Small dense symmetric eigenproblems.
//!
//! Used on the Lanczos tridiagonal matrix (at most
//! [`MAX_ITERATIONS`](crate::MAX_ITERATIONS) on a side) and in tests to
//! build reference square roots of assembled mobility matrices.

const MAX_SWEEPS: usize = 64;

/// Eigen-decomposition of a symmetric matrix.
#[derive(Clone, Debug)]
pub struct SymmetricEigen {
    /// Matrix order.
    pub n: usize,
    /// Eigenvalues, unsorted.
    pub values: Vec<f64>,
    /// Eigenvectors stored column-wise in a row-major `n × n` array:
    /// component `i` of vector `k` is `vectors[i * n + k]`.
    pub vectors: Vec<f64>,
}

impl SymmetricEigen {
    /// Decompose the row-major symmetric matrix `a` of order `n` with
    /// cyclic Jacobi rotations.
    ///
    /// # Panics
    ///
    /// If `a.len() != n * n`.
    pub fn new(mut a: Vec<f64>, n: usize) -> Self {
        assert_eq!(a.len(), n * n, "matrix is not {n} x {n}");
        let mut v = vec![0.0; n * n];
        for i in 0..n {
            v[i * n + i] = 1.0;
        }
        let total: f64 = a.iter().map(|x| x * x).sum();
        for _ in 0..MAX_SWEEPS {
            let mut off = 0.0;
            for p in 0..n {
                for q in p + 1..n {
                    off += a[p * n + q] * a[p * n + q];
                }
            }
            if off <= f64::EPSILON * f64::EPSILON * total {
                break;
            }
            for p in 0..n {
                for q in p + 1..n {
                    let apq = a[p * n + q];
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (a[q * n + q] - a[p * n + p]) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
                    let c = 1.0 / t.hypot(1.0);
                    let s = t * c;
                    for k in 0..n {
                        let akp = a[k * n + p];
                        let akq = a[k * n + q];
                        a[k * n + p] = c * akp - s * akq;
                        a[k * n + q] = s * akp + c * akq;
                    }
                    for k in 0..n {
                        let apk = a[p * n + k];
                        let aqk = a[q * n + k];
                        a[p * n + k] = c * apk - s * aqk;
                        a[q * n + k] = s * apk + c * aqk;
                    }
                    for k in 0..n {
                        let vkp = v[k * n + p];
                        let vkq = v[k * n + q];
                        v[k * n + p] = c * vkp - s * vkq;
                        v[k * n + q] = s * vkp + c * vkq;
                    }
                }
            }
        }
        Self {
            n,
            values: (0..n).map(|i| a[i * n + i]).collect(),
            vectors: v,
        }
    }

    /// Apply `f(Λ)` in the eigenbasis: returns `V f(Λ) Vᵀ x`.
    ///
    /// Negative eigenvalues produced by round-off are passed to `f` as is;
    /// callers taking square roots should clamp.
    pub fn apply_fn(&self, x: &[f64], f: impl Fn(f64) -> f64) -> Vec<f64> {
        let n = self.n;
        let mut out = vec![0.0; n];
        for k in 0..n {
            let proj: f64 = (0..n).map(|i| self.vectors[i * n + k] * x[i]).sum();
            let w = f(self.values[k]) * proj;
            for (i, o) in out.iter_mut().enumerate() {
                *o += self.vectors[i * n + k] * w;
            }
        }
        out
    }

    /// `sqrt(A) x`, with negative eigenvalues clamped to zero.
    pub fn sqrt_apply(&self, x: &[f64]) -> Vec<f64> {
        self.apply_fn(x, |l| l.max(0.0).sqrt())
    }
}

/// First column of the square root of the symmetric tridiagonal matrix
/// with diagonal `alpha` and off-diagonal `beta`.
///
/// `beta.len()` must be `alpha.len() - 1`.
pub fn sqrt_tridiagonal_e1(alpha: &[f64], beta: &[f64]) -> Vec<f64> {
    let m = alpha.len();
    debug_assert_eq!(beta.len() + 1, m.max(1));
    let mut t = vec![0.0; m * m];
    for (i, &a) in alpha.iter().enumerate() {
        t[i * m + i] = a;
    }
    for (i, &b) in beta.iter().enumerate() {
        t[i * m + i + 1] = b;
        t[(i + 1) * m + i] = b;
    }
    let mut e1 = vec![0.0; m];
    if let Some(first) = e1.first_mut() {
        *first = 1.0;
    }
    SymmetricEigen::new(t, m).sqrt_apply(&e1)
}
