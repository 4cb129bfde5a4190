//! Bounded integer parameters.

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::json_kind;

/// Number of results a listing may return, in `[1, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Limit(u32);

impl Limit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;
    pub const DEFAULT: Limit = Limit(10);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        check_bounds("limit", value, Self::MIN, Self::MAX).map(Self)
    }

    /// Accepts JSON integers and numeric strings such as `"10"`.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let number = integer_from_value("limit", value)?;
        Self::new(number)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Look-back window in days, in `[1, 365]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayRange(u32);

impl DayRange {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 365;
    pub const DEFAULT: DayRange = DayRange(7);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        check_bounds("days", value, Self::MIN, Self::MAX).map(Self)
    }

    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let number = integer_from_value("days", value)?;
        Self::new(number)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for DayRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn check_bounds(field: &'static str, value: i64, min: u32, max: u32) -> Result<u32, ValidationError> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value: value.to_string(),
        });
    }
    Ok(value as u32)
}

fn integer_from_value(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            if number.as_u64().is_some() {
                // larger than i64::MAX, certainly out of range
                return Ok(i64::MAX);
            }
            match number.as_f64() {
                Some(float) if float.is_finite() && float.fract() == 0.0 => Ok(float as i64),
                _ => Err(ValidationError::NotAnInteger {
                    field,
                    value: number.to_string(),
                }),
            }
        }
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::Empty { field });
            }
            trimmed
                .parse::<i64>()
                .map_err(|_| ValidationError::NotAnInteger {
                    field,
                    value: raw.clone(),
                })
        }
        Value::Object(_) | Value::Array(_) => Err(ValidationError::Composite {
            field,
            found: json_kind(value),
        }),
        other => Err(ValidationError::WrongType {
            field,
            expected: "number",
            found: json_kind(other),
        }),
    }
}
