//! Floating-point precision policy.
//!
//! A solver instance is generic over exactly one [`Scalar`] type, fixed
//! at compile time. Caller-supplied arrays may arrive in either width;
//! they are cast once at the public entry point and never inspected for
//! their precision afterwards.

use std::fmt;
use std::fmt::{Debug, Display};
use std::iter::Sum;

use num_traits::{Float, FloatConst, NumAssign};

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// The two floating-point widths a solver can be instantiated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 32-bit IEEE-754 (`f32`, C `float`).
    Narrow,
    /// 64-bit IEEE-754 (`f64`, C `double`).
    Wide,
}

impl Precision {
    /// Short tag: `"narrow"` or `"wide"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Wide => "wide",
        }
    }

    /// Name of the matching C type: `"float"` or `"double"`.
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Narrow => "float",
            Self::Wide => "double",
        }
    }

    /// Storage width in bits.
    pub fn bits(self) -> u32 {
        match self {
            Self::Narrow => 32,
            Self::Wide => 64,
        }
    }

    /// The other width.
    pub fn opposite(self) -> Self {
        match self {
            Self::Narrow => Self::Wide,
            Self::Wide => Self::Narrow,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Floating-point element type of a solver instance.
///
/// Sealed: only `f32` and `f64` implement it. Intended as a generic
/// bound (`T: Scalar`), never as a trait object.
///
/// # Examples
///
/// ```
/// use stokes_core::{Precision, Scalar};
///
/// assert_eq!(f32::PRECISION, Precision::Narrow);
/// assert_eq!(<f32 as Scalar>::coerce(0.1f64), 0.1f32);
/// assert_eq!(<f64 as Scalar>::coerce(0.5f32), 0.5f64);
/// ```
pub trait Scalar:
    private::Sealed
    + Float
    + FloatConst
    + NumAssign
    + Sum
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + 'static
{
    /// The precision tag of this type.
    const PRECISION: Precision;

    /// Machine epsilon.
    const EPS: Self;

    /// Cast from `f64`, rounding to nearest for narrow targets.
    fn from_real(v: f64) -> Self;

    /// Widen to `f64`. Exact for both widths.
    fn to_real(self) -> f64;

    /// Numeric cast between widths.
    ///
    /// Narrow-to-wide is exact; wide-to-narrow rounds to nearest.
    #[inline]
    fn coerce<U: Scalar>(value: U) -> Self {
        Self::from_real(value.to_real())
    }
}

impl Scalar for f32 {
    const PRECISION: Precision = Precision::Narrow;
    const EPS: Self = f32::EPSILON;

    #[inline]
    fn from_real(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_real(self) -> f64 {
        f64::from(self)
    }
}

impl Scalar for f64 {
    const PRECISION: Precision = Precision::Wide;
    const EPS: Self = f64::EPSILON;

    #[inline]
    fn from_real(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_real(self) -> f64 {
        self
    }
}
