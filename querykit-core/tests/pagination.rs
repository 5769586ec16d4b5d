use querykit_core::{
    assert_pagination_shape, normalize, NormalizedPagination, PaginationQuery, ValidationKind,
};
use serde_json::json;

fn from_json(value: serde_json::Value) -> PaginationQuery {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_empty_request_uses_defaults() {
    assert_eq!(
        normalize(&from_json(json!({}))),
        NormalizedPagination {
            page: 1,
            limit: 100,
            offset: 0
        }
    );
}

#[test]
fn test_non_positive_page_becomes_one() {
    for page in [0, -1, -250] {
        let n = normalize(&PaginationQuery::new().with_page(page).with_limit(10));
        assert_eq!(n.page, 1, "page {page}");
        assert_eq!(n.offset, 0);
    }
}

#[test]
fn test_negative_limit_becomes_zero() {
    let n = normalize(&PaginationQuery::new().with_page(3).with_limit(-5));
    assert_eq!(n.limit, 0);
    assert_eq!(n.offset, 0);
}

#[test]
fn test_invalid_pagination_is_repaired() {
    let n = normalize(&from_json(json!({"page": -1, "limit": -10})));
    assert!(n.page >= 1);
    assert_eq!(n.limit, 0);
}

#[test]
fn test_offset_derivation() {
    let cases = [
        (json!({"page": 2, "limit": 10}), 10),
        (json!({"page": 4, "limit": 25, "offset": -1}), 75),
        (json!({"page": 4, "limit": 25, "offset": "ten"}), 75),
        (json!({"page": 4, "limit": 25, "offset": 7}), 7),
        (json!({"page": 4, "limit": 25, "offset": 0}), 0),
    ];
    for (input, expected) in cases {
        let n = normalize(&from_json(input.clone()));
        assert_eq!(n.offset, expected, "{input}");
    }
}

#[test]
fn test_deserializes_mixed_param_types() {
    let q = from_json(json!({"page": "2", "limit": 2.5, "size": 9}));
    let n = normalize(&q);
    assert_eq!((n.page, n.limit, n.offset), (2, 2, 2));
}

#[test]
fn test_strict_rejects_fractional_page() {
    let err = assert_pagination_shape(Some(&from_json(json!({"page": 1.5})))).unwrap_err();
    assert_eq!(err.kind, ValidationKind::NotInteger);
    assert_eq!(err.message, "Page must be an integer");
}

#[test]
fn test_strict_rejects_non_numeric_text() {
    let err = assert_pagination_shape(Some(&from_json(json!({"limit": "lots"})))).unwrap_err();
    assert_eq!(err.message, "Limit must be an integer");
    let err = assert_pagination_shape(Some(&from_json(json!({"size": "x"})))).unwrap_err();
    assert_eq!(err.message, "Size must be an integer");
    let err = assert_pagination_shape(Some(&from_json(json!({"offset": 0.25})))).unwrap_err();
    assert_eq!(err.message, "Offset must be an integer");
}

#[test]
fn test_strict_accepts_integers() {
    assert!(assert_pagination_shape(Some(&from_json(json!({"page": 1, "limit": 100})))).is_ok());
    assert!(assert_pagination_shape(Some(&from_json(json!({"page": "3", "offset": 2.0})))).is_ok());
    assert!(assert_pagination_shape(Some(&PaginationQuery::default())).is_ok());
}

#[test]
fn test_strict_accepts_absent_pagination() {
    assert!(assert_pagination_shape(None).is_ok());
}

#[test]
fn test_strict_does_not_check_ranges() {
    // Range repair is the normalizer's job.
    assert!(assert_pagination_shape(Some(&from_json(json!({"page": -4, "limit": -1})))).is_ok());
}

#[test]
fn test_non_numeric_json_shapes_are_repaired() {
    let n = normalize(&from_json(json!({"page": true, "limit": {}, "offset": [1]})));
    assert_eq!(
        n,
        NormalizedPagination {
            page: 1,
            limit: 100,
            offset: 0
        }
    );
}

#[test]
fn test_strict_rejects_non_numeric_json_shapes() {
    let err = assert_pagination_shape(Some(&from_json(json!({"page": true})))).unwrap_err();
    assert_eq!(err.kind, ValidationKind::NotInteger);
    assert_eq!(err.message, "Page must be an integer");
    let err = assert_pagination_shape(Some(&from_json(json!({"limit": {}})))).unwrap_err();
    assert_eq!(err.message, "Limit must be an integer");
    let err = assert_pagination_shape(Some(&from_json(json!({"offset": [1]})))).unwrap_err();
    assert_eq!(err.message, "Offset must be an integer");
}

#[test]
fn test_filter_query_with_boolean_page_still_parses() {
    let query: querykit_core::GenericFilterQuery =
        serde_json::from_value(json!({"filters": [], "pagination": {"page": true, "limit": 5}})).unwrap();
    let n = normalize(&query.pagination);
    assert_eq!((n.page, n.limit), (1, 5));
}
