use querykit::prelude::*;
use querykit::{assert_pagination_shape, normalize, validate_value, PaginationQuery};
use querykit_test::{sample_items, MemoryExecutor, MemoryExpressionBuilder, MemoryStore};
use serde_json::json;

#[tokio::test]
async fn test_facade_exposes_the_fetch_flow() {
    let service = QueryOrchestrator::new("items", "id", MemoryExpressionBuilder, MemoryExecutor::new());
    let store = MemoryStore::new(sample_items(4));
    let query = GenericFilterQuery::new(vec![], PaginationQuery::new().with_size(3));

    let page = service.fetch_with_filters_and_pagination(&query, &store).await.unwrap();

    assert_eq!(page.limit, 3);
    assert_eq!(page.data.len(), 3);
    assert_eq!(page.total, 4);
}

#[test]
fn test_facade_exposes_the_standalone_operations() {
    let n = normalize(&PaginationQuery::new().with_page(2.7).with_limit(10));
    assert_eq!((n.page, n.limit, n.offset), (2, 10, 10));

    assert!(assert_pagination_shape(Some(&PaginationQuery::new().with_page(2.5))).is_err());
    assert!(validate_value(&json!({"name": "ok"})).is_ok());
    assert!(validate_value(&json!({"$gt": 1})).is_err());
}

#[cfg(feature = "sql")]
#[test]
fn test_sql_feature_exposes_the_builder() {
    let expr = querykit::querykit_sql::SqlExpressionBuilder::new("items")
        .build(&[FilterQuery::eq("name", "Item 1")])
        .unwrap();
    assert_eq!(expr.sql, "SELECT * FROM items WHERE name = ?");
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_feature_exposes_the_executor() {
    let _executor: querykit::querykit_sql::SqlxExecutor<(i64,)> = SqlxExecutor::new();
}
