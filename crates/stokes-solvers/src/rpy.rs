//! Rotne-Prager-Yamakawa pair kernels.
//!
//! All blocks are dimensionless: distances are in units of the
//! hydrodynamic radius `a` and the result must be multiplied by
//! `1 / (8 π η a)`. With that normalization the free-space self block is
//! `4/3 · I`, i.e. `1 / (6 π η a)` once scaled.

use stokes_core::Scalar;

/// A 3×3 mobility block, row-major.
pub type Block<T> = [[T; 3]; 3];

fn c<T: Scalar>(v: f64) -> T {
    T::from_real(v)
}

fn diagonal<T: Scalar>(v: T) -> Block<T> {
    let z = T::zero();
    [[v, z, z], [z, v, z], [z, z, v]]
}

/// Free-space self block, `4/3 · I`.
pub fn self_block<T: Scalar>() -> Block<T> {
    diagonal(c(4.0 / 3.0))
}

/// Free-space RPY block for separation `r = (r_i - r_j) / a`.
///
/// Overlapping pairs (`|r| <= 2`) use the regularized form; coincident
/// particles get the self block.
pub fn open<T: Scalar>(r: [T; 3]) -> Block<T> {
    let r2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];
    if r2 == T::zero() {
        return self_block();
    }
    let rn = r2.sqrt();
    let two = c::<T>(2.0);
    let (c1, c2) = if rn > two {
        let inv = rn.recip();
        let inv2 = inv * inv;
        (
            inv * (T::one() + c::<T>(2.0 / 3.0) * inv2),
            inv * (T::one() - two * inv2) * inv2,
        )
    } else {
        (
            c::<T>(4.0 / 3.0) * (T::one() - c::<T>(9.0 / 32.0) * rn),
            c::<T>(4.0 / 3.0 * 3.0 / 32.0) / rn,
        )
    };
    let mut m = diagonal(c1);
    for (i, row) in m.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v += c2 * r[i] * r[j];
        }
    }
    m
}

/// Image correction for a no-slip wall at `z = 0` (Swan and Brady).
///
/// `r` is the in-plane separation `(r_i - r_j) / a` (only x and y are
/// read); `hi`, `hj` are the heights of the target and source particle in
/// units of `a`, already clamped to at least 1. Added on top of
/// [`open`] for pairs and of [`self_block`] for `i == j`.
pub fn wall_correction<T: Scalar>(r: [T; 3], hi: T, hj: T) -> Block<T> {
    let rz = hi + hj;
    let big_r = [r[0], r[1], rz];
    let norm = (big_r[0] * big_r[0] + big_r[1] * big_r[1] + rz * rz).sqrt();
    let inv = norm.recip();
    let inv3 = inv * inv * inv;
    let inv5 = inv3 * inv * inv;
    let (ex, ey, ez) = (big_r[0] * inv, big_r[1] * inv, big_r[2] * inv);
    let h = hj / rz;
    let one = T::one();
    let ez2 = ez * ez;
    let k = |v: f64| c::<T>(v);

    let fact1 = -(k(3.0) * (one + k(2.0) * h * (one - h) * ez2) * inv
        + k(2.0) * (one - k(3.0) * ez2) * inv3
        - k(2.0) * (one - k(5.0) * ez2) * inv5)
        / k(3.0);
    let fact2 = -(k(3.0) * (one - k(6.0) * h * (one - h) * ez2) * inv
        - k(6.0) * (one - k(5.0) * ez2) * inv3
        + k(10.0) * (one - k(7.0) * ez2) * inv5)
        / k(3.0);
    let fact3 = ez
        * (k(3.0) * h * (one - k(6.0) * (one - h) * ez2) * inv
            - k(6.0) * (one - k(5.0) * ez2) * inv3
            + k(10.0) * (k(2.0) - k(7.0) * ez2) * inv5)
        * k(2.0 / 3.0);
    let fact4 = ez * (k(3.0) * h * inv - k(10.0) * inv5) * k(2.0 / 3.0);
    let fact5 = -(k(3.0) * h * h * ez2 * inv + k(3.0) * ez2 * inv3 + (k(2.0) - k(15.0) * ez2) * inv5)
        * k(4.0 / 3.0);

    [
        [
            fact1 + fact2 * ex * ex,
            fact2 * ex * ey,
            fact2 * ex * ez + fact3 * ex,
        ],
        [
            fact2 * ey * ex,
            fact1 + fact2 * ey * ey,
            fact2 * ey * ez + fact3 * ey,
        ],
        [
            fact2 * ez * ex + fact4 * ex,
            fact2 * ez * ey + fact4 * ey,
            fact1 + fact2 * ez2 + fact3 * ez + fact4 * ez + fact5,
        ],
    ]
}

/// `acc += m · f`.
#[inline]
pub fn accumulate<T: Scalar>(acc: &mut [T; 3], m: &Block<T>, f: &[T]) {
    for (a, row) in acc.iter_mut().zip(m) {
        *a += row[0] * f[0] + row[1] * f[1] + row[2] * f[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn self_block_is_stokes_drag() {
        let m = self_block::<f64>();
        assert_eq!(m[0][0], 4.0 / 3.0);
        assert_eq!(m[0][1], 0.0);
    }

    #[test]
    fn continuous_at_contact() {
        let eps = 1e-9;
        let inside = open([2.0 - eps, 0.0, 0.0f64]);
        let outside = open([2.0 + eps, 0.0, 0.0f64]);
        for i in 0..3 {
            for j in 0..3 {
                assert!(close(inside[i][j], outside[i][j], 1e-8));
            }
        }
        // Parallel and perpendicular values at r = 2a.
        assert!(close(inside[0][0], 5.0 / 6.0, 1e-8));
        assert!(close(inside[1][1], 7.0 / 12.0, 1e-8));
    }

    #[test]
    fn far_field_is_oseen() {
        let r = 1.0e4;
        let m = open([0.0, 0.0, r]);
        // Oseen: (I + r̂r̂) / r.
        assert!(close(m[2][2] * r, 2.0, 1e-6));
        assert!(close(m[0][0] * r, 1.0, 1e-6));
    }

    #[test]
    fn open_blocks_are_symmetric() {
        let m = open([0.7, -1.1, 0.4f64]);
        for i in 0..3 {
            for j in 0..3 {
                assert!(close(m[i][j], m[j][i], 1e-15));
            }
        }
        assert_eq!(open([0.7, -1.1, 0.4f64]), open([-0.7, 1.1, -0.4f64]));
    }

    #[test]
    fn wall_self_mobility_matches_expansion() {
        for h in [1.5f64, 3.0, 10.0] {
            let m = wall_correction([0.0, 0.0, 0.0], h, h);
            let parallel = (4.0 / 3.0 + m[0][0]) * 0.75;
            let perpendicular = (4.0 / 3.0 + m[2][2]) * 0.75;
            let expected_parallel =
                1.0 - 9.0 / (16.0 * h) + 1.0 / (8.0 * h.powi(3)) - 1.0 / (16.0 * h.powi(5));
            let expected_perpendicular =
                1.0 - 9.0 / (8.0 * h) + 1.0 / (2.0 * h.powi(3)) - 1.0 / (8.0 * h.powi(5));
            assert!(close(parallel, expected_parallel, 1e-12), "h = {h}");
            assert!(close(perpendicular, expected_perpendicular, 1e-12), "h = {h}");
            assert!(close(m[0][2], 0.0, 1e-15));
            assert!(close(m[2][0], 0.0, 1e-15));
        }
    }

    #[test]
    fn wall_pair_blocks_transpose_under_exchange() {
        let r = [1.3, -0.4, 0.0f64];
        let (hi, hj) = (2.0, 3.5);
        let ij = wall_correction(r, hi, hj);
        let ji = wall_correction([-r[0], -r[1], 0.0], hj, hi);
        for a in 0..3 {
            for b in 0..3 {
                assert!(close(ij[a][b], ji[b][a], 1e-12), "({a}, {b})");
            }
        }
    }

    #[test]
    fn wall_correction_vanishes_far_from_wall() {
        let m = wall_correction([0.0, 0.0, 0.0f64], 1.0e6, 1.0e6);
        assert!(m.iter().flatten().all(|v| v.abs() < 1e-5));
    }

    proptest! {
        #[test]
        fn open_block_is_symmetric_and_even(
            x in -6.0f64..6.0,
            y in -6.0f64..6.0,
            z in -6.0f64..6.0,
        ) {
            let m = open([x, y, z]);
            let flipped = open([-x, -y, -z]);
            for i in 0..3 {
                for j in 0..3 {
                    prop_assert!(close(m[i][j], m[j][i], 1e-14));
                    prop_assert!(close(m[i][j], flipped[i][j], 1e-14));
                }
            }
        }

        #[test]
        fn open_block_diagonal_is_positive(
            x in -6.0f64..6.0,
            y in -6.0f64..6.0,
            z in -6.0f64..6.0,
        ) {
            let m = open([x, y, z]);
            for (i, row) in m.iter().enumerate() {
                prop_assert!(row[i] > 0.0);
                prop_assert!(row[i] <= 4.0 / 3.0 + 1e-12);
            }
        }
    }

    #[test]
    fn accumulate_applies_block() {
        let m = [[1.0, 2.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 3.0f64]];
        let mut acc = [1.0, 0.0, 0.0];
        accumulate(&mut acc, &m, &[1.0, 1.0, 1.0]);
        assert_eq!(acc, [4.0, 1.0, 3.0]);
    }
}
