use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use querykit_core::{ExpressionBuilder, FilterOperator, FilterQuery, QueryError, QueryExecutor};
use serde_json::Value;

static NULL: Value = Value::Null;

/// A parsed predicate, ready to evaluate against JSON records.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPredicate {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl MemoryPredicate {
    pub fn matches(&self, record: &Value) -> bool {
        let actual = resolve_field(record, &self.field);
        match self.operator {
            FilterOperator::Eq => values_equal(actual, &self.value),
            FilterOperator::NotEq => !values_equal(actual, &self.value),
            FilterOperator::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (actual.as_str(), self.value.as_str()) {
                (Some(text), Some(pattern)) => like(text, pattern),
                _ => false,
            },
            FilterOperator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
            FilterOperator::IsNull => actual.is_null(),
            FilterOperator::IsNotNull => !actual.is_null(),
        }
    }

    /// SQL-like rendering, for assertions and logs (`name = ?`).
    pub fn describe(&self) -> String {
        if self.operator.is_unary() {
            format!("{} {}", self.field, self.operator.as_sql())
        } else {
            format!("{} {} ?", self.field, self.operator.as_sql())
        }
    }
}

/// The built form of a filter list: a conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryExpression {
    pub predicates: Vec<MemoryPredicate>,
}

impl MemoryExpression {
    pub fn matches(&self, record: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// `name = ? AND id > ?`-style rendering of the whole conjunction.
    pub fn describe(&self) -> String {
        self.predicates
            .iter()
            .map(MemoryPredicate::describe)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Bound values, in predicate order. Unary predicates bind nothing.
    pub fn bindings(&self) -> Vec<&Value> {
        self.predicates
            .iter()
            .filter(|p| !p.operator.is_unary())
            .map(|p| &p.value)
            .collect()
    }
}

/// Builder for [`MemoryExpression`]s. Passes filters through unmodified,
/// rejecting only operators it cannot evaluate.
#[derive(Debug, Clone, Default)]
pub struct MemoryExpressionBuilder;

impl ExpressionBuilder for MemoryExpressionBuilder {
    type Expression = MemoryExpression;

    fn build_filter_expression(&self, filters: &[FilterQuery]) -> Result<MemoryExpression, QueryError> {
        let predicates = filters
            .iter()
            .map(|filter| {
                let operator = filter.parsed_operator().ok_or_else(|| {
                    QueryError::expression(format!("Unsupported operator: {}", filter.operator))
                })?;
                Ok(MemoryPredicate {
                    field: filter.field.clone(),
                    operator,
                    value: filter.value.clone(),
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(MemoryExpression { predicates })
    }
}

/// The connection handle of the in-memory backend: the records themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    pub records: Vec<Value>,
}

impl MemoryStore {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

/// Executor returning every record of the store that satisfies the expression,
/// in store order.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering, to exercise the suspension point.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of times the executor has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }
}

impl QueryExecutor for MemoryExecutor {
    type Expression = MemoryExpression;
    type Connection = MemoryStore;
    type Row = Value;

    async fn execute_query(&self, params: &MemoryExpression, store: &MemoryStore) -> Result<Vec<Value>, QueryError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let rows: Vec<Value> = store
            .records
            .iter()
            .filter(|record| params.matches(record))
            .cloned()
            .collect();
        tracing::trace!(matched = rows.len(), scanned = store.records.len(), "memory query executed");
        Ok(rows)
    }
}

/// Error raised by [`FailingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreUnavailable(pub String);

impl std::fmt::Display for StoreUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store unavailable: {}", self.0)
    }
}

impl std::error::Error for StoreUnavailable {}

/// Executor that always fails with [`StoreUnavailable`].
#[derive(Debug, Clone)]
pub struct FailingExecutor {
    reason: String,
}

impl FailingExecutor {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl QueryExecutor for FailingExecutor {
    type Expression = MemoryExpression;
    type Connection = MemoryStore;
    type Row = Value;

    async fn execute_query(&self, _params: &MemoryExpression, _store: &MemoryStore) -> Result<Vec<Value>, QueryError> {
        Err(QueryError::upstream(StoreUnavailable(self.reason.clone())))
    }
}

/// Resolve a dotted field path (`meta.owner`, `tags[0]`) inside a record.
/// Missing segments resolve to `Value::Null`.
pub fn resolve_field<'v>(record: &'v Value, path: &str) -> &'v Value {
    let mut current = record;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (name, indices) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };
        if !name.is_empty() {
            current = current.get(name).unwrap_or(&NULL);
        }
        for index in indices.split('[').filter(|s| !s.is_empty()) {
            current = index
                .trim_end_matches(']')
                .parse::<usize>()
                .ok()
                .and_then(|i| current.get(i))
                .unwrap_or(&NULL);
        }
    }
    current
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal) || a == b
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Case-insensitive SQL `LIKE`: `%` matches any run, `_` any single char.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let (mut t, mut p) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}
