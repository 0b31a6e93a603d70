use std::{convert::TryFrom, fmt};

use serde_json::Value;

use crate::error::ForecastError;

/// Units the weather service tags quantities with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCode {
    Percent,
    DegreesCelsius,
    DegreesFahrenheit,
}

impl UnitCode {
    /// Upstream identifier, e.g. `wmoUnit:percent`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCode::Percent => "wmoUnit:percent",
            UnitCode::DegreesCelsius => "wmoUnit:degC",
            UnitCode::DegreesFahrenheit => "wmoUnit:degF",
        }
    }

    /// Display suffix appended directly to the value.
    pub fn suffix(&self) -> &'static str {
        match self {
            UnitCode::Percent => "%",
            UnitCode::DegreesCelsius => "C",
            UnitCode::DegreesFahrenheit => "F",
        }
    }

    pub const fn all() -> &'static [UnitCode] {
        &[UnitCode::Percent, UnitCode::DegreesCelsius, UnitCode::DegreesFahrenheit]
    }
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl TryFrom<&str> for UnitCode {
    type Error = ForecastError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "wmoUnit:percent" => Ok(UnitCode::Percent),
            "wmoUnit:degC" => Ok(UnitCode::DegreesCelsius),
            "wmoUnit:degF" => Ok(UnitCode::DegreesFahrenheit),
            _ => Err(ForecastError::UnrecognizedUnit(value.to_string())),
        }
    }
}

/// An integer quantity with its unit. Fractions are truncated on the way in
/// to keep the rendered text short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitValue {
    pub unit_code: UnitCode,
    pub value: i64,
}

impl UnitValue {
    /// Build from the raw upstream pair. `field` only feeds error messages.
    pub fn from_raw(field: &str, unit_code: &str, value: &Value) -> Result<Self, ForecastError> {
        let unit_code = UnitCode::try_from(unit_code)?;

        let value = match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => i,
                // f64 -> i64 casts truncate toward zero
                None => n.as_f64().map(|f| f as i64).ok_or_else(|| mismatch(field, value))?,
            },
            other => return Err(mismatch(field, other)),
        };

        Ok(Self { unit_code, value })
    }

    /// Upstream JSON shape (`unit_code` key, pre camelCase translation).
    pub fn to_raw(&self) -> Value {
        serde_json::json!({
            "unit_code": self.unit_code.as_str(),
            "value": self.value,
        })
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit_code.suffix())
    }
}

fn mismatch(field: &str, value: &Value) -> ForecastError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "an unrepresentable number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };

    ForecastError::TypeMismatch { field: field.to_string(), found }
}
