use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pagination::PaginationQuery;

/// A single `field operator value` predicate supplied by a caller.
///
/// Several filters may target the same field; backends combine them with AND.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    pub field: String,
    pub operator: String,
    /// Missing in the input deserializes to `Value::Null`.
    #[serde(default)]
    pub value: Value,
}

impl FilterQuery {
    pub fn new(field: &str, operator: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, "=", value)
    }

    /// The operator parsed into a [`FilterOperator`], if it is one the
    /// bundled backends understand.
    pub fn parsed_operator(&self) -> Option<FilterOperator> {
        FilterOperator::parse(&self.operator)
    }
}

/// The caller-facing request shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericFilterQuery {
    #[serde(default)]
    pub filters: Vec<FilterQuery>,
    #[serde(default)]
    pub pagination: PaginationQuery,
}

impl GenericFilterQuery {
    pub fn new(filters: Vec<FilterQuery>, pagination: PaginationQuery) -> Self {
        Self {
            filters,
            pagination,
        }
    }
}

/// Operators understood by the bundled expression builders.
///
/// Operator strings are matched case-insensitively; `!=` and `<>` are synonyms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub fn parse(op: &str) -> Option<Self> {
        let op = op.trim().to_ascii_lowercase();
        let parsed = match op.as_str() {
            "=" | "==" | "eq" => FilterOperator::Eq,
            "!=" | "<>" | "ne" => FilterOperator::NotEq,
            ">" | "gt" => FilterOperator::Gt,
            ">=" | "gte" => FilterOperator::Gte,
            "<" | "lt" => FilterOperator::Lt,
            "<=" | "lte" => FilterOperator::Lte,
            "like" => FilterOperator::Like,
            "in" => FilterOperator::In,
            "is null" => FilterOperator::IsNull,
            "is not null" => FilterOperator::IsNotNull,
            _ => return None,
        };
        Some(parsed)
    }

    /// The SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Like => "LIKE",
            FilterOperator::In => "IN",
            FilterOperator::IsNull => "IS NULL",
            FilterOperator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator takes no right-hand value.
    pub fn is_unary(self) -> bool {
        matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_operator_aliases() {
        assert_eq!(FilterOperator::parse("="), Some(FilterOperator::Eq));
        assert_eq!(FilterOperator::parse("<>"), Some(FilterOperator::NotEq));
        assert_eq!(FilterOperator::parse(" LIKE "), Some(FilterOperator::Like));
        assert_eq!(FilterOperator::parse("Is Not Null"), Some(FilterOperator::IsNotNull));
        assert_eq!(FilterOperator::parse("~="), None);
    }

    #[test]
    fn missing_value_deserializes_to_null() {
        let filter: FilterQuery =
            serde_json::from_value(json!({"field": "name", "operator": "="})).unwrap();
        assert_eq!(filter.value, Value::Null);
    }

    #[test]
    fn generic_query_defaults() {
        let query: GenericFilterQuery = serde_json::from_value(json!({})).unwrap();
        assert!(query.filters.is_empty());
        assert_eq!(query.pagination, PaginationQuery::default());
    }
}
