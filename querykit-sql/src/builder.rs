//! Translates [`FilterQuery`] lists into parameterized SELECT statements.
//!
//! Filters are joined with `AND`. Values are always bound, never inlined.
//! No `LIMIT`/`OFFSET` is emitted: the executor must return every matching
//! row so the orchestrator can count them before slicing the page.
//!
//! # Example
//!
//! ```ignore
//! let builder = SqlExpressionBuilder::new("items")
//!     .dialect(Dialect::Postgres)
//!     .order_by("id", true);
//! let expr = builder.build_filter_expression(&[FilterQuery::eq("name", "Item 1")])?;
//! assert_eq!(expr.sql, "SELECT * FROM items WHERE name = $1 ORDER BY id ASC");
//! ```

use querykit_core::{ExpressionBuilder, FilterOperator, FilterQuery, QueryError};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `?` placeholders, double-quoted identifiers.
    #[default]
    Generic,
    Sqlite,
    /// `?` placeholders, backtick-quoted identifiers.
    MySql,
    /// Numbered `$n` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Do not validate or quote identifiers. Only for trusted field names.
    Raw,
    /// Accept only `[A-Za-z_][A-Za-z0-9_]*` segments joined by dots.
    #[default]
    Validate,
    /// Validate, then quote each segment for the dialect.
    Quote,
}

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlParam {
    fn from_scalar(column: &str, value: &Value) -> Result<Self, QueryError> {
        match value {
            Value::Null => Ok(SqlParam::Null),
            Value::Bool(b) => Ok(SqlParam::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(SqlParam::Int(i)),
                None => n
                    .as_f64()
                    .map(SqlParam::Float)
                    .ok_or_else(|| QueryError::expression(format!("Unrepresentable number for {column}"))),
            },
            Value::String(s) => Ok(SqlParam::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(QueryError::expression(format!(
                "Cannot bind a structured value to {column}"
            ))),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

/// A built statement and its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlExpression {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Clone)]
pub struct SqlExpressionBuilder {
    table: String,
    columns: Vec<String>,
    order: Vec<(String, bool)>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl SqlExpressionBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            order: Vec::new(),
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Validate,
        }
    }

    /// Set the SQL dialect (affects placeholder style and quoting).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Configure identifier validation/quoting behavior.
    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    /// Columns to select. Empty (the default) selects `*`.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Append a fixed ordering. Page slices are only stable under a total order.
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Build the SELECT for `filters`.
    pub fn build(&self, filters: &[FilterQuery]) -> Result<SqlExpression, QueryError> {
        let table = self.format_identifier(&self.table, false, "table")?;
        let columns = self.format_column_list()?;

        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        let mut placeholder_idx = 1usize;
        self.append_where(filters, &mut sql, &mut params, &mut placeholder_idx)?;
        self.append_order(&mut sql)?;
        Ok(SqlExpression { sql, params })
    }

    fn append_where(
        &self,
        filters: &[FilterQuery],
        sql: &mut String,
        params: &mut Vec<SqlParam>,
        placeholder_idx: &mut usize,
    ) -> Result<(), QueryError> {
        if filters.is_empty() {
            return Ok(());
        }
        sql.push_str(" WHERE ");
        let mut first = true;
        for filter in filters {
            if !first {
                sql.push_str(" AND ");
            }
            first = false;

            let op = filter.parsed_operator().ok_or_else(|| {
                QueryError::expression(format!("Unsupported operator: {}", filter.operator))
            })?;
            let col = self.format_identifier(&filter.field, false, "column")?;
            match op {
                FilterOperator::IsNull | FilterOperator::IsNotNull => {
                    sql.push_str(&format!("{col} {}", op.as_sql()));
                }
                FilterOperator::In => {
                    let values = match &filter.value {
                        Value::Array(values) if !values.is_empty() => values,
                        _ => {
                            return Err(QueryError::expression(format!(
                                "IN on {} requires a non-empty array",
                                filter.field
                            )))
                        }
                    };
                    let mut placeholders = Vec::with_capacity(values.len());
                    for value in values {
                        placeholders.push(self.dialect.placeholder(*placeholder_idx));
                        *placeholder_idx += 1;
                        params.push(SqlParam::from_scalar(&filter.field, value)?);
                    }
                    sql.push_str(&format!("{col} IN ({})", placeholders.join(", ")));
                }
                FilterOperator::Like if !filter.value.is_string() => {
                    return Err(QueryError::expression(format!(
                        "LIKE on {} requires a string pattern",
                        filter.field
                    )));
                }
                _ => {
                    let placeholder = self.dialect.placeholder(*placeholder_idx);
                    *placeholder_idx += 1;
                    sql.push_str(&format!("{col} {} {placeholder}", op.as_sql()));
                    params.push(SqlParam::from_scalar(&filter.field, &filter.value)?);
                }
            }
        }
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        sql.push_str(" ORDER BY ");
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.format_identifier(col, false, "column")?;
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn format_column_list(&self) -> Result<String, QueryError> {
        if self.columns.is_empty() {
            return Ok("*".to_string());
        }
        let mut out = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            out.push(self.format_identifier(col, true, "column")?);
        }
        Ok(out.join(", "))
    }

    fn format_identifier(
        &self,
        ident: &str,
        allow_star: bool,
        kind: &'static str,
    ) -> Result<String, QueryError> {
        if self.identifier_policy == IdentifierPolicy::Raw {
            return Ok(ident.to_string());
        }
        if !is_valid_identifier(ident, allow_star) {
            tracing::warn!(kind, ident, "rejecting invalid SQL identifier");
            return Err(QueryError::expression(format!("Invalid {kind} identifier: {ident}")));
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect, allow_star)),
            IdentifierPolicy::Raw | IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

impl ExpressionBuilder for SqlExpressionBuilder {
    type Expression = SqlExpression;

    fn build_filter_expression(&self, filters: &[FilterQuery]) -> Result<SqlExpression, QueryError> {
        self.build(filters)
    }
}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_filters() {
        let expr = SqlExpressionBuilder::new("items").build(&[]).unwrap();
        assert_eq!(expr.sql, "SELECT * FROM items");
        assert!(expr.params.is_empty());
    }

    #[test]
    fn test_equality_filter() {
        let expr = SqlExpressionBuilder::new("items")
            .build(&[FilterQuery::eq("name", "Item 1")])
            .unwrap();
        assert_eq!(expr.sql, "SELECT * FROM items WHERE name = ?");
        assert_eq!(expr.params, vec![SqlParam::from("Item 1")]);
    }

    #[test]
    fn test_conjunction_and_order() {
        let expr = SqlExpressionBuilder::new("items")
            .columns(&["id", "name"])
            .order_by("id", false)
            .build(&[
                FilterQuery::new("id", ">=", 2),
                FilterQuery::new("name", "like", "Item%"),
                FilterQuery::new("deleted_at", "is null", Value::Null),
            ])
            .unwrap();
        assert_eq!(
            expr.sql,
            "SELECT id, name FROM items WHERE id >= ? AND name LIKE ? AND deleted_at IS NULL ORDER BY id DESC"
        );
        assert_eq!(expr.params, vec![SqlParam::Int(2), SqlParam::from("Item%")]);
    }

    #[test]
    fn test_postgres_placeholders() {
        let expr = SqlExpressionBuilder::new("users")
            .dialect(Dialect::Postgres)
            .build(&[
                FilterQuery::eq("status", "active"),
                FilterQuery::new("role", "in", json!(["admin", "user"])),
            ])
            .unwrap();
        assert_eq!(expr.sql, "SELECT * FROM users WHERE status = $1 AND role IN ($2, $3)");
        assert_eq!(
            expr.params,
            vec![SqlParam::from("active"), SqlParam::from("admin"), SqlParam::from("user")]
        );
    }

    #[test]
    fn test_quoting() {
        let expr = SqlExpressionBuilder::new("users")
            .dialect(Dialect::MySql)
            .identifier_policy(IdentifierPolicy::Quote)
            .columns(&["users.*"])
            .order_by("users.id", true)
            .build(&[FilterQuery::eq("users.email", "a@b.com")])
            .unwrap();
        assert_eq!(
            expr.sql,
            "SELECT `users`.* FROM `users` WHERE `users`.`email` = ? ORDER BY `users`.`id` ASC"
        );
    }

    #[test]
    fn test_invalid_identifier() {
        let err = SqlExpressionBuilder::new("items")
            .build(&[FilterQuery::eq("name; drop table items", "x")])
            .unwrap_err();
        assert!(matches!(err, QueryError::Expression(ref msg) if msg.starts_with("Invalid column identifier")));
    }

    #[test]
    fn test_unknown_operator() {
        let err = SqlExpressionBuilder::new("items")
            .build(&[FilterQuery::new("name", "~", "x")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Expression error: Unsupported operator: ~");
    }

    #[test]
    fn test_structured_values_rejected() {
        assert!(SqlExpressionBuilder::new("items")
            .build(&[FilterQuery::eq("name", json!({"a": 1}))])
            .is_err());
        assert!(SqlExpressionBuilder::new("items")
            .build(&[FilterQuery::new("id", "in", json!([]))])
            .is_err());
        assert!(SqlExpressionBuilder::new("items")
            .build(&[FilterQuery::new("name", "like", 3)])
            .is_err());
    }
}
