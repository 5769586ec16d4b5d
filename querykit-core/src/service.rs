//! The query orchestrator and the two collaborator seams it drives.
//!
//! A fetch runs `prepare -> execute -> measure -> shape -> respond`. The
//! expression builder and query executor are injected; everything store
//! specific lives behind them. The executor returns *all* matching rows and
//! the page window is cut in-process, so `total` is always the full match
//! count.

use std::future::Future;

use serde_json::Value;

use crate::error::QueryError;
use crate::filter::{FilterOperator, FilterQuery, GenericFilterQuery};
use crate::page::{slice_page, PaginatedResponse};
use crate::pagination::{NormalizedPagination, PaginationPolicy};
use crate::validation::{ValidatorOptions, ValueValidator};

/// Translates caller filters into a store-native query representation.
///
/// Implementations are pure: no I/O. Filters the store cannot express should
/// fail with [`QueryError::Expression`].
pub trait ExpressionBuilder: Send + Sync {
    type Expression: Send + Sync;

    fn build_filter_expression(&self, filters: &[FilterQuery]) -> Result<Self::Expression, QueryError>;
}

/// Runs a built expression against a store and returns every matching row.
///
/// Timeouts and retries, if any, belong here. Store failures should be
/// wrapped with [`QueryError::upstream`].
pub trait QueryExecutor: Send + Sync {
    type Expression: Send + Sync;
    /// Handle passed through untouched on every call (a pool, a client, ...).
    type Connection: ?Sized + Sync;
    type Row: Send;

    fn execute_query(
        &self,
        params: &Self::Expression,
        connection: &Self::Connection,
    ) -> impl Future<Output = Result<Vec<Self::Row>, QueryError>> + Send;
}

pub type ExpressionOf<S> = <<S as QueryService>::Builder as ExpressionBuilder>::Expression;
pub type RowOf<S> = <<S as QueryService>::Executor as QueryExecutor>::Row;
pub type ConnectionOf<S> = <<S as QueryService>::Executor as QueryExecutor>::Connection;

/// Table (or collection) a service reads from and its primary-key field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub table: String,
    pub key_field: String,
}

impl QueryTarget {
    pub fn new(table: &str, key_field: &str) -> Self {
        Self {
            table: table.to_string(),
            key_field: key_field.to_string(),
        }
    }

    /// Value of the first equality filter on the primary key, if any.
    pub fn key_lookup<'f>(&self, filters: &'f [FilterQuery]) -> Option<&'f Value> {
        filters
            .iter()
            .find(|f| f.field == self.key_field && f.parsed_operator() == Some(FilterOperator::Eq))
            .map(|f| &f.value)
    }
}

/// Output of the prepare step: the built expression plus normalized bounds.
#[derive(Debug, Clone)]
pub struct PreparedQuery<X> {
    pub params: X,
    pub pagination: NormalizedPagination,
    /// Primary-key value when the request is a point lookup. Recorded for
    /// services that override `prepare` or `shape`; the default flow ignores it.
    pub key_lookup: Option<Value>,
}

impl<X> PreparedQuery<X> {
    pub fn page(&self) -> u64 {
        self.pagination.page
    }

    pub fn limit(&self) -> u64 {
        self.pagination.limit
    }

    pub fn offset(&self) -> u64 {
        self.pagination.offset
    }
}

/// Default prepare step: validate filters, normalize pagination, build the
/// expression.
///
/// Validation runs first so rejected input never reaches the builder or the
/// store.
pub fn prepare_query<B: ExpressionBuilder>(
    builder: &B,
    target: &QueryTarget,
    validator: &ValueValidator,
    policy: &PaginationPolicy,
    query: &GenericFilterQuery,
) -> Result<PreparedQuery<B::Expression>, QueryError> {
    validator.validate_filters(&query.filters)?;
    let pagination = policy.normalize(&query.pagination);
    let params = builder.build_filter_expression(&query.filters)?;
    Ok(PreparedQuery {
        params,
        pagination,
        key_lookup: target.key_lookup(&query.filters).cloned(),
    })
}

/// A paginated, filtered read over one table.
///
/// Implementors supply the collaborators and the `shape` step; `prepare` and
/// `on_error` have defaults that can be overridden.
///
/// # Example
///
/// ```ignore
/// struct UserService { target: QueryTarget, builder: SqlExpressionBuilder, executor: SqlxExecutor<User> }
///
/// impl QueryService for UserService {
///     type Builder = SqlExpressionBuilder;
///     type Executor = SqlxExecutor<User>;
///     type Item = UserDto;
///
///     fn target(&self) -> &QueryTarget { &self.target }
///     fn builder(&self) -> &Self::Builder { &self.builder }
///     fn executor(&self) -> &Self::Executor { &self.executor }
///
///     fn shape(&self, rows: Vec<User>, prepared: &PreparedQuery<SqlExpression>) -> Result<Vec<UserDto>, QueryError> {
///         Ok(slice_page(rows, &prepared.pagination).into_iter().map(UserDto::from).collect())
///     }
/// }
///
/// let page = service.fetch_with_filters_and_pagination(&query, &pool).await?;
/// ```
pub trait QueryService: Send + Sync {
    type Builder: ExpressionBuilder;
    type Executor: QueryExecutor<Expression = <Self::Builder as ExpressionBuilder>::Expression>;
    type Item: Send;

    fn target(&self) -> &QueryTarget;
    fn builder(&self) -> &Self::Builder;
    fn executor(&self) -> &Self::Executor;

    fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::default()
    }

    fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions::default()
    }

    fn prepare(&self, query: &GenericFilterQuery) -> Result<PreparedQuery<ExpressionOf<Self>>, QueryError> {
        prepare_query(
            self.builder(),
            self.target(),
            &ValueValidator::new(self.validator_options()),
            &self.pagination_policy(),
            query,
        )
    }

    /// Turn the executor's full row set into the page content.
    fn shape(
        &self,
        rows: Vec<RowOf<Self>>,
        prepared: &PreparedQuery<ExpressionOf<Self>>,
    ) -> Result<Vec<Self::Item>, QueryError>;

    /// Observe a failed fetch. The error is returned to the caller afterwards
    /// regardless of what this does.
    fn on_error(&self, error: &QueryError) {
        tracing::error!(table = %self.target().table, error = %error, "query fetch failed");
    }

    fn fetch_with_filters_and_pagination(
        &self,
        query: &GenericFilterQuery,
        connection: &ConnectionOf<Self>,
    ) -> impl Future<Output = Result<PaginatedResponse<Self::Item>, QueryError>> + Send {
        async move {
            let result = async {
                let prepared = self.prepare(query)?;
                tracing::debug!(
                    table = %self.target().table,
                    filters = query.filters.len(),
                    page = prepared.page(),
                    limit = prepared.limit(),
                    offset = prepared.offset(),
                    "prepared query"
                );
                let rows = self
                    .executor()
                    .execute_query(&prepared.params, connection)
                    .await?;
                let total = rows.len() as u64;
                let data = self.shape(rows, &prepared)?;
                tracing::debug!(table = %self.target().table, total, returned = data.len(), "query fetched");
                Ok::<_, QueryError>(PaginatedResponse::new(data, &prepared.pagination, total))
            }
            .await;
            if let Err(err) = &result {
                self.on_error(err);
            }
            result
        }
    }
}

/// Constructor-injected [`QueryService`] whose page content is the raw rows
/// in the `[offset, offset + limit)` window.
///
/// Holds only immutable collaborators, so one instance can serve concurrent
/// fetches.
#[derive(Debug, Clone)]
pub struct QueryOrchestrator<B, E> {
    target: QueryTarget,
    builder: B,
    executor: E,
    policy: PaginationPolicy,
    validator: ValidatorOptions,
}

impl<B, E> QueryOrchestrator<B, E>
where
    B: ExpressionBuilder,
    E: QueryExecutor<Expression = B::Expression>,
{
    pub fn new(table: &str, key_field: &str, builder: B, executor: E) -> Self {
        Self {
            target: QueryTarget::new(table, key_field),
            builder,
            executor,
            policy: PaginationPolicy::default(),
            validator: ValidatorOptions::default(),
        }
    }

    pub fn with_pagination_policy(mut self, policy: PaginationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_validator_options(mut self, options: ValidatorOptions) -> Self {
        self.validator = options;
        self
    }
}

impl<B, E> QueryService for QueryOrchestrator<B, E>
where
    B: ExpressionBuilder,
    E: QueryExecutor<Expression = B::Expression>,
{
    type Builder = B;
    type Executor = E;
    type Item = E::Row;

    fn target(&self) -> &QueryTarget {
        &self.target
    }

    fn builder(&self) -> &B {
        &self.builder
    }

    fn executor(&self) -> &E {
        &self.executor
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        self.policy
    }

    fn validator_options(&self) -> ValidatorOptions {
        self.validator
    }

    fn shape(&self, rows: Vec<E::Row>, prepared: &PreparedQuery<B::Expression>) -> Result<Vec<E::Row>, QueryError> {
        Ok(slice_page(rows, &prepared.pagination))
    }
}
