use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::ValidationError;
use crate::json_kind;

/// A non-empty scalar string: flow names, screenshot hashes, assertion
/// text, model ids.
///
/// Surrounding whitespace is trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Validate an untyped parameter, e.g. one that arrived as JSON.
    pub fn from_value(field: &'static str, value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(raw) => Self::parse(field, raw),
            Value::Object(_) | Value::Array(_) => Err(ValidationError::Composite {
                field,
                found: json_kind(value),
            }),
            other => Err(ValidationError::WrongType {
                field,
                expected: "string",
                found: json_kind(other),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
