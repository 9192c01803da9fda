//! The tagged type and value enums underlying every [`super::Parameter`].

use std::fmt;
use std::path::PathBuf;

/// The declared type of a parameter.
///
/// `Integral` and `Real` accept any Rust integer/float width supplied
/// through [`ParamValue::Int`]/[`ParamValue::Float`] -- pydidas's original
/// normalizes `numbers.Integral`/`numbers.Real` subclasses the same way, so
/// narrowing to `i64`/`f64` here keeps that "accept all widths" behaviour
/// without a generic parameter on every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Integral,
    Real,
    Text,
    Path,
    Hdf5Key,
    Boolean,
    Enum,
    /// No type checking is performed; any value is accepted.
    Unconstrained,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Integral => "integer",
            ParamType::Real => "float",
            ParamType::Text => "text",
            ParamType::Path => "path",
            ParamType::Hdf5Key => "hdf5 key",
            ParamType::Boolean => "boolean",
            ParamType::Enum => "enum",
            ParamType::Unconstrained => "unconstrained",
        };
        f.write_str(name)
    }
}

/// The actual value carried by a [`super::Parameter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    Path(PathBuf),
    Hdf5Key(String),
    Bool(bool),
    None,
}

impl ParamValue {
    /// The [`ParamType`] this value would satisfy, ignoring `Unconstrained`
    /// and `Enum` (which are checked against a caller-supplied choice set,
    /// not inferred from the value's own shape).
    pub fn natural_type(&self) -> Option<ParamType> {
        match self {
            ParamValue::Int(_) => Some(ParamType::Integral),
            ParamValue::Float(_) => Some(ParamType::Real),
            ParamValue::Text(_) => Some(ParamType::Text),
            ParamValue::Path(_) => Some(ParamType::Path),
            ParamValue::Hdf5Key(_) => Some(ParamType::Hdf5Key),
            ParamValue::Bool(_) => Some(ParamType::Boolean),
            ParamValue::None => None,
        }
    }

    /// Check this value against a declared type. `Unconstrained` always
    /// passes; `Real` also accepts an `Int` (widened, matching
    /// `numbers.Real` accepting `numbers.Integral` in the original); `Enum`
    /// accepts anything here since its legality is a choice-set membership
    /// check performed separately by [`super::Parameter::set_value`].
    pub fn typecheck(&self, ty: ParamType) -> bool {
        match (self, ty) {
            (_, ParamType::Unconstrained) => true,
            (_, ParamType::Enum) => true,
            (ParamValue::None, _) => true,
            (ParamValue::Int(_), ParamType::Integral) => true,
            (ParamValue::Int(_), ParamType::Real) => true,
            (ParamValue::Float(_), ParamType::Real) => true,
            (ParamValue::Text(_), ParamType::Text) => true,
            (ParamValue::Path(_), ParamType::Path) => true,
            (ParamValue::Hdf5Key(_), ParamType::Hdf5Key) => true,
            (ParamValue::Bool(_), ParamType::Boolean) => true,
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) | ParamValue::Hdf5Key(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            ParamValue::Path(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ParamValue::None)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) | ParamValue::Hdf5Key(v) => write!(f, "{v}"),
            ParamValue::Path(v) => write!(f, "{}", v.display()),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::None => write!(f, "None"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_accepts_integral() {
        assert!(ParamValue::Int(4).typecheck(ParamType::Real));
    }

    #[test]
    fn integral_rejects_float() {
        assert!(!ParamValue::Float(4.0).typecheck(ParamType::Integral));
    }

    #[test]
    fn unconstrained_accepts_anything() {
        assert!(ParamValue::Text("x".into()).typecheck(ParamType::Unconstrained));
        assert!(ParamValue::Bool(true).typecheck(ParamType::Unconstrained));
    }

    #[test]
    fn none_always_typechecks() {
        assert!(ParamValue::None.typecheck(ParamType::Integral));
        assert!(ParamValue::None.typecheck(ParamType::Text));
    }
}
