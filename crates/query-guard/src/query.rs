//! Parameter bundles for repository reads.

use serde_json::Value;

use crate::error::ValidationError;
use crate::identifier::Identifier;
use crate::range::{DayRange, Limit};

/// Parameters of a "most recent runs of a flow" read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentResultsQuery {
    pub flow_name: Identifier,
    pub limit: Limit,
}

impl RecentResultsQuery {
    pub fn new(flow_name: Identifier, limit: Limit) -> Self {
        Self { flow_name, limit }
    }

    /// Validate untyped parameters. A missing (`null`) limit takes the
    /// default; anything else must be an integer in range.
    pub fn from_params(flow_name: &Value, limit: &Value) -> Result<Self, ValidationError> {
        let flow_name = Identifier::from_value("flowName", flow_name)?;
        let limit = match limit {
            Value::Null => Limit::default(),
            other => Limit::from_value(other)?,
        };
        Ok(Self { flow_name, limit })
    }
}

/// Parameters of a pass/fail/error summary over a look-back window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummaryQuery {
    pub flow_name: Identifier,
    pub days: DayRange,
}

impl RunSummaryQuery {
    pub fn new(flow_name: Identifier, days: DayRange) -> Self {
        Self { flow_name, days }
    }

    pub fn from_params(flow_name: &Value, days: &Value) -> Result<Self, ValidationError> {
        let flow_name = Identifier::from_value("flowName", flow_name)?;
        let days = match days {
            Value::Null => DayRange::default(),
            other => DayRange::from_value(other)?,
        };
        Ok(Self { flow_name, days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recent_results_validates_both_params() {
        let query = RecentResultsQuery::from_params(&json!("checkout"), &json!(5)).unwrap();
        assert_eq!(query.flow_name.as_str(), "checkout");
        assert_eq!(query.limit.get(), 5);

        assert!(RecentResultsQuery::from_params(&json!("checkout"), &json!(0)).is_err());
        assert!(RecentResultsQuery::from_params(&json!("checkout"), &json!(101)).is_err());
        assert!(RecentResultsQuery::from_params(&json!("checkout"), &json!("many")).is_err());
        assert!(RecentResultsQuery::from_params(&json!(""), &json!(5)).is_err());
    }

    #[test]
    fn missing_limit_uses_default() {
        let query = RecentResultsQuery::from_params(&json!("checkout"), &Value::Null).unwrap();
        assert_eq!(query.limit, Limit::DEFAULT);
    }

    #[test]
    fn summary_rejects_composite_name() {
        let err = RunSummaryQuery::from_params(&json!({ "$ne": "" }), &json!(30)).unwrap_err();
        assert!(matches!(err, ValidationError::Composite { .. }));
        assert_eq!(
            RunSummaryQuery::from_params(&json!("checkout"), &json!(30))
                .unwrap()
                .days
                .get(),
            30
        );
    }
}
