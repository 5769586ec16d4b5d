//! Pagination input handling.
//!
//! Two independent policies are exposed:
//!
//! - [`normalize`] is permissive. It never fails and repairs any
//!   out-of-range or malformed input into safe, bounded integers.
//! - [`assert_pagination_shape`] is strict. It rejects pagination fields that
//!   are not representable as integers, for callers who prefer a 400 over a
//!   silent repair.
//!
//! Callers pick one (or run the strict check before normalizing).

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationKind};

/// Default number of rows per page when the caller gives no limit.
pub const DEFAULT_LIMIT: u64 = 100;

/// A loosely typed pagination field as it arrives from untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaginationParam {
    Int(i64),
    Float(f64),
    Text(String),
    /// Any other JSON shape (bool, object, array). Never numeric.
    Other(serde_json::Value),
}

impl PaginationParam {
    /// Numeric reading of the field. Numeric text is coerced; anything
    /// non-finite or unparseable yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PaginationParam::Int(i) => Some(*i as f64),
            PaginationParam::Float(f) => f.is_finite().then_some(*f),
            PaginationParam::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            PaginationParam::Other(_) => None,
        }
    }

    /// Whether the field is a real number (text does not count).
    fn as_strict_number(&self) -> Option<f64> {
        match self {
            PaginationParam::Int(i) => Some(*i as f64),
            PaginationParam::Float(f) => f.is_finite().then_some(*f),
            PaginationParam::Text(_) | PaginationParam::Other(_) => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            PaginationParam::Int(_) => true,
            PaginationParam::Float(f) => f.is_finite() && f.fract() == 0.0,
            PaginationParam::Text(s) => {
                let s = s.trim();
                !s.is_empty()
                    && s.parse::<f64>()
                        .map(|f| f.is_finite() && f.fract() == 0.0)
                        .unwrap_or(false)
            }
            PaginationParam::Other(_) => false,
        }
    }
}

impl From<i64> for PaginationParam {
    fn from(v: i64) -> Self {
        PaginationParam::Int(v)
    }
}

impl From<i32> for PaginationParam {
    fn from(v: i32) -> Self {
        PaginationParam::Int(v.into())
    }
}

impl From<f64> for PaginationParam {
    fn from(v: f64) -> Self {
        PaginationParam::Float(v)
    }
}

impl From<&str> for PaginationParam {
    fn from(v: &str) -> Self {
        PaginationParam::Text(v.to_string())
    }
}

/// Raw pagination request. All fields are optional; `size` is an alias for
/// `limit` and never appears in the normalized output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PaginationParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<PaginationParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<PaginationParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<PaginationParam>,
}

impl PaginationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: impl Into<PaginationParam>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_limit(mut self, limit: impl Into<PaginationParam>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn with_offset(mut self, offset: impl Into<PaginationParam>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<PaginationParam>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// Always-valid pagination bounds derived from a [`PaginationQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizedPagination {
    /// 1-based page number, at least 1.
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Defaults and caps applied by the permissive normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPolicy {
    /// Limit used when neither `limit` nor `size` is usable.
    pub default_limit: u64,
    /// Optional upper bound on the limit. `None` leaves it unbounded.
    pub max_limit: Option<u64>,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

impl PaginationPolicy {
    pub fn normalize(&self, pagination: &PaginationQuery) -> NormalizedPagination {
        let page = pagination
            .page
            .as_ref()
            .and_then(PaginationParam::as_number)
            .map(|p| floor_clamped(p, 1))
            .unwrap_or(1);

        let mut limit = pagination
            .limit
            .as_ref()
            .and_then(PaginationParam::as_number)
            .or_else(|| pagination.size.as_ref().and_then(PaginationParam::as_number))
            .map(|l| floor_clamped(l, 0))
            .unwrap_or(self.default_limit);
        if let Some(max) = self.max_limit {
            limit = limit.min(max);
        }

        let offset = match pagination.offset.as_ref().and_then(PaginationParam::as_strict_number) {
            Some(o) if o >= 0.0 => o.floor() as u64,
            _ => (page - 1).saturating_mul(limit),
        };

        NormalizedPagination {
            page,
            limit,
            offset,
        }
    }
}

/// Floor `value` and clamp it to at least `min`. Values past `u64::MAX`
/// saturate.
fn floor_clamped(value: f64, min: u64) -> u64 {
    value.floor().max(min as f64) as u64
}

/// Repair a raw pagination request using the default policy
/// (`page = 1`, `limit = 100`, offset derived from page and limit).
pub fn normalize(pagination: &PaginationQuery) -> NormalizedPagination {
    PaginationPolicy::default().normalize(pagination)
}

/// Reject pagination whose present fields are not integers.
///
/// `None` is accepted: absent pagination means defaults.
pub fn assert_pagination_shape(pagination: Option<&PaginationQuery>) -> Result<(), ValidationError> {
    let Some(pagination) = pagination else {
        return Ok(());
    };
    let fields = [
        ("Page", &pagination.page),
        ("Size", &pagination.size),
        ("Limit", &pagination.limit),
        ("Offset", &pagination.offset),
    ];
    for (name, field) in fields {
        if let Some(param) = field {
            if !param.is_integer() {
                tracing::debug!(field = name, value = ?param, "rejecting non-integer pagination field");
                return Err(ValidationError::new(
                    ValidationKind::NotInteger,
                    format!("{name} must be an integer"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let n = normalize(&PaginationQuery::default());
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
    fn test_offset_derived_from_page() {
        let n = normalize(&PaginationQuery::new().with_page(3).with_limit(20));
        assert_eq!(n.offset, 40);
    }

    #[test]
    fn test_explicit_offset_wins() {
        let n = normalize(&PaginationQuery::new().with_page(3).with_limit(20).with_offset(5));
        assert_eq!(n.offset, 5);
    }

    #[test]
    fn test_negative_offset_is_derived() {
        let n = normalize(&PaginationQuery::new().with_page(2).with_limit(10).with_offset(-4));
        assert_eq!(n.offset, 10);
    }

    #[test]
    fn test_fractional_values_floor() {
        let n = normalize(&PaginationQuery::new().with_page(2.9).with_limit(10.7));
        assert_eq!((n.page, n.limit, n.offset), (2, 10, 10));
    }

    #[test]
    fn test_text_offset_is_not_a_number() {
        let n = normalize(&PaginationQuery::new().with_page(2).with_limit(5).with_offset("3"));
        assert_eq!(n.offset, 5);
    }

    #[test]
    fn test_numeric_text_page_is_coerced() {
        let n = normalize(&PaginationQuery::new().with_page("4").with_limit("abc"));
        assert_eq!((n.page, n.limit), (4, 100));
    }

    #[test]
    fn test_size_is_limit_alias() {
        let n = normalize(&PaginationQuery::new().with_size(15));
        assert_eq!(n.limit, 15);
        let n = normalize(&PaginationQuery::new().with_size(15).with_limit(7));
        assert_eq!(n.limit, 7);
    }

    #[test]
    fn test_huge_values_saturate() {
        let n = normalize(&PaginationQuery::new().with_page(i64::MAX).with_limit(i64::MAX));
        assert_eq!(n.offset, u64::MAX);
    }

    #[test]
    fn test_policy_caps_limit() {
        let policy = PaginationPolicy {
            default_limit: 25,
            max_limit: Some(50),
        };
        assert_eq!(policy.normalize(&PaginationQuery::default()).limit, 25);
        assert_eq!(policy.normalize(&PaginationQuery::new().with_limit(500)).limit, 50);
    }

    #[test]
    fn test_integer_shape() {
        assert!(PaginationParam::from(2.0).is_integer());
        assert!(PaginationParam::from("12").is_integer());
        assert!(!PaginationParam::from("").is_integer());
        assert!(!PaginationParam::from(f64::NAN).is_integer());
    }
}
