//! A single named, typed, validated value.

use std::fmt;

use crate::errors::ParameterError;
use crate::observability::messages::parameter::{ParameterRejected, ParameterRestoredToDefault};
use crate::observability::messages::StructuredLog;

use super::value::{ParamType, ParamValue};

/// The 6-field tuple a [`Parameter`] serializes to, matching the
/// `(refkey, type, value, optional, description, unit)` shape used
/// throughout the original for dumping and restoring parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDump {
    pub refkey: String,
    pub ty: ParamType,
    pub value: ParamValue,
    pub optional: bool,
    pub description: String,
    pub unit: String,
}

/// A named, typed value with a default, an optional choice set, and display
/// metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    refkey: String,
    name: String,
    ty: ParamType,
    default: ParamValue,
    value: ParamValue,
    optional: bool,
    choices: Option<Vec<ParamValue>>,
    unit: String,
    tooltip: String,
}

impl Parameter {
    /// Create a new parameter. Fails if `default` does not satisfy `ty`, or
    /// is not a member of `choices` when `ty` is [`ParamType::Enum`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        refkey: impl Into<String>,
        name: impl Into<String>,
        ty: ParamType,
        default: ParamValue,
        optional: bool,
        choices: Option<Vec<ParamValue>>,
        unit: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Result<Self, ParameterError> {
        let refkey = refkey.into();
        if !default.typecheck(ty) {
            return Err(ParameterError::TypeMismatch {
                refkey,
                value: default.to_string(),
                expected_type: ty.to_string(),
            });
        }
        if ty == ParamType::Enum {
            if let Some(choices) = &choices {
                if !default.is_none() && !choices.contains(&default) {
                    return Err(ParameterError::NotAChoice {
                        refkey,
                        value: default.to_string(),
                        choices: choices.iter().map(|c| c.to_string()).collect(),
                    });
                }
            }
        }
        Ok(Self {
            refkey,
            name: name.into(),
            ty,
            default: default.clone(),
            value: default,
            optional,
            choices,
            unit: unit.into(),
            tooltip: tooltip.into(),
        })
    }

    pub fn refkey(&self) -> &str {
        &self.refkey
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.ty
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    pub fn default(&self) -> &ParamValue {
        &self.default
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    pub fn choices(&self) -> Option<&[ParamValue]> {
        self.choices.as_deref()
    }

    /// Validate and store a new value. A `None` value is only accepted for
    /// optional parameters.
    pub fn set_value(&mut self, value: ParamValue) -> Result<(), ParameterError> {
        if value.is_none() && !self.optional {
            return Err(ParameterError::NotOptional(self.refkey.clone()));
        }
        if !value.typecheck(self.ty) {
            let err = ParameterError::TypeMismatch {
                refkey: self.refkey.clone(),
                value: value.to_string(),
                expected_type: self.ty.to_string(),
            };
            ParameterRejected {
                refkey: &self.refkey,
                value: value.to_string(),
                reason: err.to_string(),
            }
            .log();
            return Err(err);
        }
        if self.ty == ParamType::Enum && !value.is_none() {
            if let Some(choices) = &self.choices {
                if !choices.contains(&value) {
                    let err = ParameterError::NotAChoice {
                        refkey: self.refkey.clone(),
                        value: value.to_string(),
                        choices: choices.iter().map(|c| c.to_string()).collect(),
                    };
                    ParameterRejected {
                        refkey: &self.refkey,
                        value: value.to_string(),
                        reason: err.to_string(),
                    }
                    .log();
                    return Err(err);
                }
            }
        }
        self.value = value;
        Ok(())
    }

    /// Reset this parameter's value to its default.
    pub fn restore_default(&mut self) {
        self.value = self.default.clone();
        ParameterRestoredToDefault {
            refkey: &self.refkey,
        }
        .log();
    }

    /// A deep copy, equivalent to the original's `get_copy()`.
    pub fn get_copy(&self) -> Self {
        self.clone()
    }

    pub fn dump(&self) -> ParamDump {
        ParamDump {
            refkey: self.refkey.clone(),
            ty: self.ty,
            value: self.value.clone(),
            optional: self.optional,
            description: self.tooltip.clone(),
            unit: self.unit.clone(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.value, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_param() -> Parameter {
        Parameter::new(
            "n_workers",
            "Number of workers",
            ParamType::Integral,
            ParamValue::Int(4),
            false,
            None,
            "",
            "How many worker threads to spawn.",
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_default() {
        let err = Parameter::new(
            "n_workers",
            "Number of workers",
            ParamType::Integral,
            ParamValue::Text("four".into()),
            false,
            None,
            "",
            "",
        )
        .unwrap_err();
        assert!(matches!(err, ParameterError::TypeMismatch { .. }));
    }

    #[test]
    fn set_value_typechecks() {
        let mut p = int_param();
        assert!(p.set_value(ParamValue::Int(8)).is_ok());
        assert_eq!(p.value(), &ParamValue::Int(8));
        assert!(p.set_value(ParamValue::Text("x".into())).is_err());
    }

    #[test]
    fn none_requires_optional() {
        let mut p = int_param();
        assert!(p.set_value(ParamValue::None).is_err());
    }

    #[test]
    fn restore_default_reverts_value() {
        let mut p = int_param();
        p.set_value(ParamValue::Int(99)).unwrap();
        p.restore_default();
        assert_eq!(p.value(), &ParamValue::Int(4));
    }

    #[test]
    fn enum_rejects_value_outside_choices() {
        let mut p = Parameter::new(
            "multi_frame_handling",
            "Multi-frame handling",
            ParamType::Enum,
            ParamValue::Text("Average".into()),
            false,
            Some(vec![
                ParamValue::Text("Average".into()),
                ParamValue::Text("Sum".into()),
            ]),
            "",
            "",
        )
        .unwrap();
        assert!(p.set_value(ParamValue::Text("Maximum".into())).is_err());
        assert!(p.set_value(ParamValue::Text("Sum".into())).is_ok());
    }
}
