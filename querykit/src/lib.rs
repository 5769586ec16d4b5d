//! querykit: validated, paginated reads over any store.
//!
//! This facade crate re-exports the querykit sub-crates through a single
//! dependency with feature flags.
//!
//! ```ignore
//! use querykit::prelude::*;
//!
//! let service = QueryOrchestrator::new("items", "id", SqlExpressionBuilder::new("items"), SqlxExecutor::<Item>::new());
//! let page = service.fetch_with_filters_and_pagination(&query, &pool).await?;
//! ```
//!
//! # Feature flags
//!
//! | Feature      | Default | Crate                     |
//! |--------------|---------|---------------------------|
//! | `sql`        | no      | `querykit-sql` (builder)  |
//! | `sqlite`     | no      | `querykit-sql/sqlite` (`SqlxExecutor`) |
//! | `test-utils` | no      | `querykit-test`           |
//! | `full`       | no      | All of the above          |

pub extern crate querykit_core;

pub use querykit_core::*;

#[cfg(feature = "sql")]
pub use querykit_sql;

#[cfg(feature = "test-utils")]
pub use querykit_test;

/// Unified prelude: the core prelude plus types from all enabled feature crates.
pub mod prelude {
    pub use querykit_core::prelude::*;

    #[cfg(feature = "sql")]
    pub use querykit_sql::prelude::*;
}
