use thiserror::Error;

/// A parameter was rejected before any persistence call was made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be a {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Objects and arrays where a scalar is expected. These are how
    /// operator injection reaches a schemaless query layer.
    #[error("{field} must be a scalar, got {found}")]
    Composite {
        field: &'static str,
        found: &'static str,
    },

    #[error("{field} must be an integer, got {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: String,
    },

    #[error("{field} must be at most {max} characters, got {len}")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("{field} looks like a backtracking-prone pattern: {value}")]
    UnsafePattern { field: &'static str, value: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Empty { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::Composite { field, .. }
            | ValidationError::NotAnInteger { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::UnsafePattern { field, .. } => field,
        }
    }
}
