//! Free-text search input.

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::error::ValidationError;
use crate::json_kind;

pub const MAX_SEARCH_LEN: usize = 100;

const FIELD: &str = "query";

/// A search term matched as a case-insensitive literal.
///
/// Regex metacharacters are escaped before compilation, so user input is
/// never interpreted as a pattern. Input that is itself shaped like a
/// catastrophic-backtracking pattern (`(a+)+`, `(x*)*`) is refused outright.
#[derive(Clone, Debug)]
pub struct SearchQuery {
    term: String,
    matcher: Regex,
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let term = raw.trim();
        if term.is_empty() {
            return Err(ValidationError::Empty { field: FIELD });
        }
        let len = term.chars().count();
        if len > MAX_SEARCH_LEN {
            return Err(ValidationError::TooLong {
                field: FIELD,
                max: MAX_SEARCH_LEN,
                len,
            });
        }
        if has_nested_quantifier(term) {
            return Err(ValidationError::UnsafePattern {
                field: FIELD,
                value: term.to_string(),
            });
        }

        let escaped = regex::escape(term);
        let matcher = RegexBuilder::new(&escaped)
            .case_insensitive(true)
            .build()
            .map_err(|_| ValidationError::UnsafePattern {
                field: FIELD,
                value: term.to_string(),
            })?;
        debug!(term = %term, pattern = %escaped, "search query accepted");
        Ok(Self {
            term: term.to_string(),
            matcher,
        })
    }

    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(raw) => Self::parse(raw),
            Value::Object(_) | Value::Array(_) => Err(ValidationError::Composite {
                field: FIELD,
                found: json_kind(value),
            }),
            other => Err(ValidationError::WrongType {
                field: FIELD,
                expected: "string",
                found: json_kind(other),
            }),
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Escaped pattern source.
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.matcher.is_match(haystack)
    }
}

impl PartialEq for SearchQuery {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}

impl Eq for SearchQuery {}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.term)
    }
}

fn is_quantifier(c: char) -> bool {
    matches!(c, '+' | '*' | '?' | '{')
}

/// True when a group containing a quantifier is itself quantified.
fn has_nested_quantifier(term: &str) -> bool {
    let chars: Vec<char> = term.chars().collect();
    // one flag per open group: has a quantifier appeared inside it
    let mut open: Vec<bool> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '(' => open.push(false),
            ')' => {
                if let Some(inner) = open.pop() {
                    let quantified = chars.get(i + 1).copied().is_some_and(is_quantifier);
                    if inner && quantified {
                        return true;
                    }
                    if let Some(parent) = open.last_mut() {
                        *parent |= inner || quantified;
                    }
                }
            }
            c if is_quantifier(c) => {
                if let Some(group) = open.last_mut() {
                    *group = true;
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}
