//! Particle coordinates stored at solver precision.

use crate::error::MobilityError;
use crate::scalar::Scalar;

/// Cast a caller slice into a freshly allocated vector at precision `T`.
pub fn coerce<T: Scalar, U: Scalar>(values: &[U]) -> Vec<T> {
    values.iter().map(|&v| T::coerce(v)).collect()
}

/// Cast a caller slice into an existing buffer of the same length.
///
/// # Errors
///
/// [`MobilityError::Shape`] if the lengths differ. `dst` is untouched then.
pub fn coerce_into<T: Scalar, U: Scalar>(
    input: &'static str,
    src: &[U],
    dst: &mut [T],
) -> Result<(), MobilityError> {
    if src.len() != dst.len() {
        return Err(MobilityError::Shape {
            input,
            expected: dst.len(),
            found: src.len(),
        });
    }
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = T::coerce(s);
    }
    Ok(())
}

/// Flat particle-major coordinate array `[x0, y0, z0, x1, ...]` of length 3N.
///
/// The length is fixed when the buffer is created; assignment replaces
/// all values or none.
///
/// # Examples
///
/// ```
/// use stokes_core::PositionBuffer;
///
/// let mut buf = PositionBuffer::<f32>::with_particles(2);
/// assert_eq!(buf.as_slice(), &[0.0; 6]);
///
/// buf.assign(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(buf.particle(1), [4.0, 5.0, 6.0]);
///
/// assert!(buf.assign(&[1.0f64; 5]).is_err());
/// assert_eq!(buf.particle(0), [1.0, 2.0, 3.0]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionBuffer<T> {
    data: Vec<T>,
}

impl<T: Scalar> PositionBuffer<T> {
    /// Zero-filled buffer for `n` particles.
    pub fn with_particles(n: usize) -> Self {
        Self {
            data: vec![T::zero(); 3 * n],
        }
    }

    /// Buffer holding no particles.
    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    /// Number of particles, `len / 3`.
    pub fn number_particles(&self) -> usize {
        self.data.len() / 3
    }

    /// `true` if the buffer holds no particles.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw coordinate array.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Coordinates of particle `i`.
    ///
    /// # Panics
    ///
    /// If `i` is out of range.
    pub fn particle(&self, i: usize) -> [T; 3] {
        [self.data[3 * i], self.data[3 * i + 1], self.data[3 * i + 2]]
    }

    /// Replace every coordinate, casting from the caller's precision.
    ///
    /// # Errors
    ///
    /// [`MobilityError::Shape`] if `positions.len() != 3N`.
    pub fn assign<U: Scalar>(&mut self, positions: &[U]) -> Result<(), MobilityError> {
        coerce_into("positions", positions, &mut self.data)
    }

    /// Release the storage.
    pub fn clear(&mut self) {
        self.data = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn shape_error_reports_lengths() {
        let mut buf = PositionBuffer::<f64>::with_particles(1);
        let err = buf.assign(&[0.0f32; 4]).unwrap_err();
        assert_eq!(
            err,
            MobilityError::Shape {
                input: "positions",
                expected: 3,
                found: 4,
            }
        );
    }

    #[test]
    fn clear_releases_storage() {
        let mut buf = PositionBuffer::<f64>::with_particles(3);
        assert_eq!(buf.number_particles(), 3);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(PositionBuffer::<f64>::empty(), buf);
    }

    #[test]
    fn coerce_narrows() {
        let v: Vec<f32> = coerce(&[0.1f64, 0.2]);
        assert_eq!(v, vec![0.1f32, 0.2f32]);
    }

    proptest! {
        #[test]
        fn assign_replaces_wholesale(values in prop::collection::vec(-1e6f64..1e6, 3..=30)) {
            let n = values.len() / 3;
            let values = &values[..3 * n];
            let mut buf = PositionBuffer::<f32>::with_particles(n);
            buf.assign(values).unwrap();
            for (stored, given) in buf.as_slice().iter().zip(values) {
                prop_assert_eq!(*stored, *given as f32);
            }
        }

        #[test]
        fn wrong_length_leaves_buffer_unchanged(n in 1usize..10, extra in 1usize..3) {
            let mut buf = PositionBuffer::<f64>::with_particles(n);
            let bad = vec![1.0f64; 3 * n + extra];
            prop_assert!(buf.assign(&bad).is_err());
            prop_assert!(buf.as_slice().iter().all(|&v| v == 0.0));
        }
    }
}
