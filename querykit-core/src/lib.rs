//! # querykit-core
//!
//! Store-agnostic core of querykit: a caller hands over filters and loosely
//! typed pagination, and gets back a [`PaginatedResponse`] after the request
//! went through an injected [`ExpressionBuilder`] and [`QueryExecutor`].
//!
//! | Item | Description |
//! |------|-------------|
//! | [`normalize`] | Permissive pagination repair, never fails |
//! | [`assert_pagination_shape`] | Strict pagination check, rejects non-integers |
//! | [`validate_value`] | Rejects NoSQL-injection-shaped values |
//! | [`QueryService`] | The fetch flow with overridable prepare/shape/error hooks |
//! | [`QueryOrchestrator`] | Constructor-injected `QueryService` with slice shaping |
//! | [`QueryKitConfig`] | YAML + env configuration |

pub mod config;
pub mod error;
pub mod filter;
pub mod page;
pub mod pagination;
pub mod service;
pub mod telemetry;
pub mod validation;

pub use config::{ConfigError, LogFormat, QueryKitConfig};
pub use error::{QueryError, ValidationError, ValidationKind};
pub use filter::{FilterOperator, FilterQuery, GenericFilterQuery};
pub use page::{slice_page, PaginatedResponse};
pub use pagination::{
    assert_pagination_shape, normalize, NormalizedPagination, PaginationParam, PaginationPolicy,
    PaginationQuery,
};
pub use service::{
    prepare_query, ExpressionBuilder, PreparedQuery, QueryExecutor, QueryOrchestrator,
    QueryService, QueryTarget,
};
pub use telemetry::init_tracing;
pub use validation::{validate_filters, validate_value, ValidatorOptions, ValueValidator};

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use crate::{
        ExpressionBuilder, FilterQuery, GenericFilterQuery, PaginatedResponse, PaginationQuery,
        QueryError, QueryExecutor, QueryOrchestrator, QueryService, ValidationError,
    };
}
