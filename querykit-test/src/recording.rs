use std::sync::Mutex;

use querykit_core::{
    ExpressionBuilder, PaginationPolicy, PreparedQuery, QueryError, QueryExecutor,
    QueryOrchestrator, QueryService, QueryTarget, ValidatorOptions,
};

/// A [`QueryOrchestrator`] that also remembers every error its error hook saw.
///
/// ```ignore
/// let service = RecordingOrchestrator::new(QueryOrchestrator::new("items", "id", builder, executor));
/// let _ = service.fetch_with_filters_and_pagination(&query, &store).await;
/// assert_eq!(service.observed_errors().len(), 1);
/// ```
pub struct RecordingOrchestrator<B, E> {
    inner: QueryOrchestrator<B, E>,
    errors: Mutex<Vec<String>>,
}

impl<B, E> RecordingOrchestrator<B, E>
where
    B: ExpressionBuilder,
    E: QueryExecutor<Expression = B::Expression>,
{
    pub fn new(inner: QueryOrchestrator<B, E>) -> Self {
        Self {
            inner,
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Display strings of the errors observed so far, oldest first.
    pub fn observed_errors(&self) -> Vec<String> {
        match self.errors.lock() {
            Ok(errors) => errors.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl<B, E> QueryService for RecordingOrchestrator<B, E>
where
    B: ExpressionBuilder,
    E: QueryExecutor<Expression = B::Expression>,
{
    type Builder = B;
    type Executor = E;
    type Item = E::Row;

    fn target(&self) -> &QueryTarget {
        self.inner.target()
    }

    fn builder(&self) -> &B {
        self.inner.builder()
    }

    fn executor(&self) -> &E {
        self.inner.executor()
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        self.inner.pagination_policy()
    }

    fn validator_options(&self) -> ValidatorOptions {
        self.inner.validator_options()
    }

    fn shape(&self, rows: Vec<E::Row>, prepared: &PreparedQuery<B::Expression>) -> Result<Vec<E::Row>, QueryError> {
        self.inner.shape(rows, prepared)
    }

    fn on_error(&self, error: &QueryError) {
        self.inner.on_error(error);
        match self.errors.lock() {
            Ok(mut errors) => errors.push(error.to_string()),
            Err(poisoned) => poisoned.into_inner().push(error.to_string()),
        }
    }
}
