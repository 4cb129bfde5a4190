//! Query guard.
//!
//! Every parameter that reaches the flow repository or the vision cache goes
//! through one of the validated types here first. The persistence APIs accept
//! only these types, so an unchecked string or number cannot get there.
//!
//! Validation is synchronous and has no side effects.

pub mod error;
pub mod identifier;
pub mod query;
pub mod range;
pub mod search;

pub use error::ValidationError;
pub use identifier::Identifier;
pub use query::{RecentResultsQuery, RunSummaryQuery};
pub use range::{DayRange, Limit};
pub use search::{SearchQuery, MAX_SEARCH_LEN};

use serde_json::Value;

/// Name of the JSON type of `value`, used in rejection messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
