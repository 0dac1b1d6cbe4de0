//! Reusable storage for Krylov square-root sampling.
//!
//! One [`KrylovWorkspace`] lives in each solver and is reset at the
//! start of every Lanczos run, so repeated fluctuation draws reuse the
//! same allocations. The orthonormal basis is kept in `f64` regardless
//! of solver precision; the operator is applied at precision `T`
//! through a pair of conversion buffers.

use stokes_core::Scalar;

/// Orthonormal Krylov basis plus the buffers for one operator application.
#[derive(Debug, Default)]
pub struct KrylovWorkspace<T> {
    dim: usize,
    basis: Vec<f64>,
    residual: Vec<f64>,
    op_in: Vec<T>,
    op_out: Vec<T>,
}

impl<T: Scalar> KrylovWorkspace<T> {
    /// An empty workspace. Storage is allocated on the first [`reset`](Self::reset).
    pub fn new() -> Self {
        Self {
            dim: 0,
            basis: Vec::new(),
            residual: Vec::new(),
            op_in: Vec::new(),
            op_out: Vec::new(),
        }
    }

    /// Prepare for vectors of length `dim`, discarding the basis.
    pub fn reset(&mut self, dim: usize) {
        self.dim = dim;
        self.basis.clear();
        self.residual.clear();
        self.residual.resize(dim, 0.0);
        self.op_in.clear();
        self.op_in.resize(dim, T::zero());
        self.op_out.clear();
        self.op_out.resize(dim, T::zero());
    }

    /// Vector length set by the last reset.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of basis vectors currently stored.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.basis.len() / self.dim
        }
    }

    /// `true` if no basis vector is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Basis vector `j`.
    pub fn basis_vector(&self, j: usize) -> &[f64] {
        &self.basis[j * self.dim..(j + 1) * self.dim]
    }

    /// The current residual.
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// Append `v * scale` to the basis.
    pub fn push_scaled(&mut self, v: &[f64], scale: f64) {
        debug_assert_eq!(v.len(), self.dim);
        self.basis.extend(v.iter().map(|x| x * scale));
    }

    /// Append the residual divided by `norm` to the basis.
    pub fn push_residual(&mut self, norm: f64) {
        let inv = 1.0 / norm;
        self.basis.extend(self.residual.iter().map(|x| x * inv));
    }

    /// Set the residual to `M v_last` and return `v_last · M v_last`.
    ///
    /// `apply` receives the input and output at solver precision.
    pub fn apply_last<F>(&mut self, apply: &mut F) -> f64
    where
        F: FnMut(&[T], &mut [T]),
    {
        let last = self.len() - 1;
        let start = last * self.dim;
        for (dst, &src) in self.op_in.iter_mut().zip(&self.basis[start..]) {
            *dst = T::from_real(src);
        }
        self.op_out.fill(T::zero());
        apply(&self.op_in, &mut self.op_out);
        for (dst, &src) in self.residual.iter_mut().zip(&self.op_out) {
            *dst = src.to_real();
        }
        dot(&self.basis[start..], &self.residual)
    }

    /// Remove every basis direction from the residual (two passes of
    /// classical Gram-Schmidt) and return the remaining norm.
    pub fn orthogonalize(&mut self) -> f64 {
        if self.dim == 0 {
            return 0.0;
        }
        for _ in 0..2 {
            for v in self.basis.chunks_exact(self.dim) {
                let h = dot(v, &self.residual);
                for (r, &b) in self.residual.iter_mut().zip(v) {
                    *r -= h * b;
                }
            }
        }
        dot(&self.residual, &self.residual).sqrt()
    }

    /// Write `scale * Σ_j coeffs[j] v_j` into `out`.
    pub fn combine(&self, coeffs: &[f64], scale: f64, out: &mut [T]) {
        if self.dim == 0 {
            return;
        }
        let mut acc = vec![0.0; self.dim];
        for (v, &c) in self.basis.chunks_exact(self.dim).zip(coeffs) {
            for (a, &b) in acc.iter_mut().zip(v) {
                *a += c * b;
            }
        }
        for (o, a) in out.iter_mut().zip(acc) {
            *o = T::from_real(scale * a);
        }
    }

    /// Release all storage.
    pub fn release(&mut self) {
        *self = Self::new();
    }

    /// Bytes currently reserved by the workspace.
    pub fn capacity_bytes(&self) -> usize {
        (self.basis.capacity() + self.residual.capacity()) * std::mem::size_of::<f64>()
            + (self.op_in.capacity() + self.op_out.capacity()) * std::mem::size_of::<T>()
    }
}

/// Euclidean inner product.
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
