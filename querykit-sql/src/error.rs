use querykit_core::QueryError;

/// Extension trait for converting `sqlx::Error` into `QueryError`.
///
/// Due to Rust's orphan rules, we can't implement `From<sqlx::Error> for QueryError`
/// in this crate. Use `.into_query_error()` instead. The driver error is kept
/// intact as the `Upstream` source.
pub trait SqlxErrorExt {
    fn into_query_error(self) -> QueryError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_query_error(self) -> QueryError {
        QueryError::upstream(self)
    }
}
