use querykit_core::{
    ExpressionBuilder, FilterQuery, GenericFilterQuery, PaginationQuery, QueryError, QueryOrchestrator,
    QueryService,
};
use querykit_sql::{SqlExpressionBuilder, SqlParam, SqlxExecutor};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct Item {
    id: i64,
    name: String,
    price: f64,
}

async fn setup_pool(count: i64) -> SqlitePool {
    // A single connection: every connection to `sqlite::memory:` is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    for i in 1..=count {
        sqlx::query("INSERT INTO items (id, name, price) VALUES (?, ?, ?)")
            .bind(i)
            .bind(format!("Item {i}"))
            .bind(i as f64 * 1.5)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}

fn service() -> QueryOrchestrator<SqlExpressionBuilder, SqlxExecutor<Item>> {
    QueryOrchestrator::new(
        "items",
        "id",
        SqlExpressionBuilder::new("items").order_by("id", true),
        SqlxExecutor::new(),
    )
}

#[tokio::test]
async fn test_first_page_of_three() {
    let pool = setup_pool(3).await;
    let query = GenericFilterQuery::new(vec![], PaginationQuery::new().with_page(1).with_limit(2));
    let page = service().fetch_with_filters_and_pagination(&query, &pool).await.unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 3);
    assert_eq!((page.page, page.limit), (1, 2));
    assert_eq!(page.data[0].name, "Item 1");
}

#[tokio::test]
async fn test_empty_table() {
    let pool = setup_pool(0).await;
    let page = service()
        .fetch_with_filters_and_pagination(&GenericFilterQuery::default(), &pool)
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_equality_filter_is_bound() {
    let pool = setup_pool(3).await;
    let filters = vec![FilterQuery::new("name", "=", "Item 1")];

    let expr = service().builder().build_filter_expression(&filters).unwrap();
    assert!(expr.sql.contains("name = "));
    assert_eq!(expr.params, vec![SqlParam::from("Item 1")]);

    let query = GenericFilterQuery::new(filters, PaginationQuery::default());
    let page = service().fetch_with_filters_and_pagination(&query, &pool).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(
        page.data,
        vec![Item {
            id: 1,
            name: "Item 1".to_string(),
            price: 1.5
        }]
    );
}

#[tokio::test]
async fn test_range_and_in_filters() {
    let pool = setup_pool(10).await;
    let query = GenericFilterQuery::new(
        vec![
            FilterQuery::new("price", ">", 3.0),
            FilterQuery::new("id", "in", json!([2, 3, 4, 9])),
        ],
        PaginationQuery::new().with_limit(2),
    );
    let page = service().fetch_with_filters_and_pagination(&query, &pool).await.unwrap();
    // price > 3.0 excludes ids 1 and 2.
    assert_eq!(page.total, 3);
    let ids: Vec<_> = page.data.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![3, 4]);
}

#[tokio::test]
async fn test_like_filter_with_offset() {
    let pool = setup_pool(12).await;
    let query = GenericFilterQuery::new(
        vec![FilterQuery::new("name", "like", "Item 1%")],
        PaginationQuery::new().with_limit(2).with_offset(1),
    );
    let page = service().fetch_with_filters_and_pagination(&query, &pool).await.unwrap();
    // Item 1, Item 10, Item 11, Item 12
    assert_eq!(page.total, 4);
    let ids: Vec<_> = page.data.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![10, 11]);
}

#[tokio::test]
async fn test_injection_never_reaches_sqlite() {
    let pool = setup_pool(3).await;
    let query = GenericFilterQuery::new(
        vec![FilterQuery::eq("name", json!({"$ne": "nobody"}))],
        PaginationQuery::default(),
    );
    let err = service()
        .fetch_with_filters_and_pagination(&query, &pool)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_missing_table_is_upstream_error() {
    let pool = setup_pool(0).await;
    let service = QueryOrchestrator::new(
        "missing",
        "id",
        SqlExpressionBuilder::new("missing"),
        SqlxExecutor::<Item>::new(),
    );
    let err = service
        .fetch_with_filters_and_pagination(&GenericFilterQuery::default(), &pool)
        .await
        .unwrap_err();
    match err {
        QueryError::Upstream(inner) => assert!(inner.downcast_ref::<sqlx::Error>().is_some()),
        other => panic!("unexpected error: {other}"),
    }
}
