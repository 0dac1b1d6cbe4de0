//! Named backend options.
//!
//! Each backend declares a fixed table of [`OptionSpec`]s and a typed
//! options struct implementing [`SolverOptions`]. Setting an option by
//! name only succeeds for declared names with the declared value kind;
//! domain checks are deferred to `initialize`.

use std::fmt;

use crate::error::ConfigError;

/// Kind of value an option accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Floating-point number. Integers are accepted and widened.
    Real,
    /// Signed integer.
    Integer,
    /// Free-form text.
    Text,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::Integer => write!(f, "integer"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A value supplied for a named option.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    /// Floating-point value.
    Real(f64),
    /// Integer value.
    Integer(i64),
    /// Text value.
    Text(String),
}

impl OptionValue {
    /// The kind of this value.
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::Real(_) => OptionKind::Real,
            Self::Integer(_) => OptionKind::Integer,
            Self::Text(_) => OptionKind::Text,
        }
    }

    /// Read as a real number. Integers are widened.
    pub fn as_real(&self, name: &'static str) -> Result<f64, ConfigError> {
        match self {
            Self::Real(v) => Ok(*v),
            Self::Integer(v) => Ok(*v as f64),
            Self::Text(_) => Err(self.mismatch(name, OptionKind::Real)),
        }
    }

    /// Read as an integer.
    pub fn as_integer(&self, name: &'static str) -> Result<i64, ConfigError> {
        match self {
            Self::Integer(v) => Ok(*v),
            _ => Err(self.mismatch(name, OptionKind::Integer)),
        }
    }

    /// Read as text.
    pub fn as_text(&self, name: &'static str) -> Result<&str, ConfigError> {
        match self {
            Self::Text(v) => Ok(v),
            _ => Err(self.mismatch(name, OptionKind::Text)),
        }
    }

    fn mismatch(&self, name: &'static str, expected: OptionKind) -> ConfigError {
        ConfigError::OptionKindMismatch {
            name,
            expected,
            found: self.kind(),
        }
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<f32> for OptionValue {
    fn from(v: f32) -> Self {
        Self::Real(f64::from(v))
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Declaration of one backend option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    /// Option name as accepted by `set_option`.
    pub name: &'static str,
    /// Accepted value kind.
    pub kind: OptionKind,
    /// Whether `initialize` fails when the option is unset.
    pub required: bool,
    /// One-line description, including the valid domain.
    pub description: &'static str,
}

/// Typed, statically declared options of one backend.
///
/// # Examples
///
/// ```
/// use stokes_core::{ConfigError, OptionKind, OptionSpec, OptionValue, SolverOptions};
///
/// #[derive(Clone, Debug, Default)]
/// struct Demo {
///     width: Option<f64>,
/// }
///
/// impl SolverOptions for Demo {
///     const SOLVER: &'static str = "Demo";
///
///     fn specs() -> &'static [OptionSpec] {
///         &[OptionSpec {
///             name: "width",
///             kind: OptionKind::Real,
///             required: true,
///             description: "box width, > 0",
///         }]
///     }
///
///     fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
///         let spec = Self::spec(name)?;
///         self.width = Some(value.as_real(spec.name)?);
///         Ok(())
///     }
/// }
///
/// let mut demo = Demo::default();
/// demo.set("width", 2.0.into()).unwrap();
/// assert_eq!(demo.width, Some(2.0));
/// assert!(demo.set("height", 1.0.into()).is_err());
/// ```
pub trait SolverOptions: Clone + fmt::Debug + Default + Send + 'static {
    /// Name of the backend these options belong to.
    const SOLVER: &'static str;

    /// The declared option table.
    fn specs() -> &'static [OptionSpec];

    /// Record one option by name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownOption`] for undeclared names and
    /// [`ConfigError::OptionKindMismatch`] for values of the wrong kind.
    fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError>;

    /// Look up the declaration for `name`.
    fn spec(name: &str) -> Result<&'static OptionSpec, ConfigError> {
        Self::specs()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ConfigError::UnknownOption {
                solver: Self::SOLVER,
                name: name.to_string(),
            })
    }

    /// Record several options, stopping at the first error.
    fn set_all<I, K>(&mut self, items: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: AsRef<str>,
    {
        for (name, value) in items {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_to_real() {
        assert_eq!(OptionValue::from(3).as_real("x").unwrap(), 3.0);
    }

    #[test]
    fn reals_are_not_integers() {
        let err = OptionValue::from(3.5).as_integer("n").unwrap_err();
        assert_eq!(
            err,
            ConfigError::OptionKindMismatch {
                name: "n",
                expected: OptionKind::Integer,
                found: OptionKind::Real,
            }
        );
    }

    #[test]
    fn text_values() {
        let v = OptionValue::from("advise");
        assert_eq!(v.kind(), OptionKind::Text);
        assert_eq!(v.as_text("algorithm").unwrap(), "advise");
        assert!(v.as_real("algorithm").is_err());
    }
}
