//! # querykit-sql — SQL backend for querykit
//!
//! Provides the SQL implementations of querykit's two collaborator seams.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlExpressionBuilder`] | `ExpressionBuilder` producing parameterized SELECTs |
//! | [`SqlExpression`] | SQL text plus bind values |
//! | [`Dialect`] / [`IdentifierPolicy`] | Placeholder style and identifier checking |
//! | [`SqlxExecutor`] | `QueryExecutor` over an `sqlx::SqlitePool` (feature `sqlite`) |
//! | [`SqlxErrorExt`] | Converts `sqlx::Error` into `QueryError::Upstream` |
//!
//! # Feature flags
//!
//! | Feature  | Default | Enables |
//! |----------|---------|---------|
//! | `sqlite` | yes     | `SqlxExecutor` via `sqlx/sqlite` |
//!
//! The builder never emits `LIMIT`/`OFFSET`; the executor returns all matching
//! rows and the orchestrator slices the requested page.

pub mod builder;
pub mod error;
#[cfg(feature = "sqlite")]
pub mod executor;

pub use builder::{Dialect, IdentifierPolicy, SqlExpression, SqlExpressionBuilder, SqlParam};
pub use error::SqlxErrorExt;
#[cfg(feature = "sqlite")]
pub use executor::SqlxExecutor;

/// Re-exports of the most commonly used types from both `querykit-core` and this crate.
pub mod prelude {
    pub use crate::{Dialect, SqlExpression, SqlExpressionBuilder};
    #[cfg(feature = "sqlite")]
    pub use crate::SqlxExecutor;
    pub use querykit_core::prelude::*;
}
