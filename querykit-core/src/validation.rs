//! Rejection of NoSQL-injection-shaped filter values.
//!
//! Two layers run over every value:
//!
//! 1. A case-insensitive substring scan of the value's compact JSON form
//!    against [`DENY_LIST`]. This is a heuristic: legitimate strings that
//!    happen to contain a token (`"constructor"`) are rejected too.
//! 2. A structural walk that rejects nulls, oversized strings, empty arrays
//!    and deny-listed object keys. The key check is the authoritative one.
//!
//! The walk uses an explicit stack, so input depth never translates into
//! call-stack depth. A depth cap (on by default) bounds the work done on
//! pathological input before the JSON form is ever built.

use serde_json::Value;

use crate::error::{ValidationError, ValidationKind};
use crate::filter::FilterQuery;

/// Operator-like tokens and prototype keys that must never reach a query builder.
pub const DENY_LIST: &[&str] = &[
    "$where",
    "$regex",
    "$ne",
    "$gt",
    "$lt",
    "$gte",
    "$lte",
    "$in",
    "$nin",
    "$or",
    "$and",
    "$not",
    "$exists",
    "$type",
    "$mod",
    "$text",
    "$elemMatch",
    "$size",
    "$all",
    "$expr",
    "__proto__",
    "constructor",
    "prototype",
];

/// Maximum string length, in UTF-16 code units.
pub const MAX_STRING_LENGTH: usize = 400_000;

/// Default nesting cap for [`ValidatorOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

const INJECTION_MESSAGE: &str = "Potential NoSQL injection detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    pub max_string_length: usize,
    /// Deepest allowed nesting; the root is depth 0. `None` disables the cap.
    pub max_depth: Option<usize>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_string_length: MAX_STRING_LENGTH,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

/// Configurable value validator. [`validate_value`] uses the defaults.
#[derive(Debug, Clone, Default)]
pub struct ValueValidator {
    options: ValidatorOptions,
}

impl ValueValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Validate a single value. Returns the first violation found, walking
    /// depth-first in document order.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            return Err(missing());
        }
        if let Some(max_depth) = self.options.max_depth {
            check_depth(value, max_depth)?;
        }
        if contains_denied_token(&value.to_string()) {
            tracing::warn!("rejecting value containing a denied operator token");
            return Err(ValidationError::new(ValidationKind::Injection, INJECTION_MESSAGE));
        }
        self.walk(value)
    }

    /// Validate every filter of a request: field names must not carry a
    /// denied token and every value must pass [`validate`](Self::validate).
    ///
    /// Unary operators (`is null`, `is not null`) may omit their value.
    pub fn validate_filters(&self, filters: &[FilterQuery]) -> Result<(), ValidationError> {
        for (idx, filter) in filters.iter().enumerate() {
            if contains_denied_token(&filter.field) {
                tracing::warn!(field = %filter.field, "rejecting filter on a denied field name");
                return Err(ValidationError::new(ValidationKind::Injection, INJECTION_MESSAGE)
                    .at(&format!("/filters/{idx}/field")));
            }
            let unary = filter.parsed_operator().is_some_and(|op| op.is_unary());
            if unary && filter.value.is_null() {
                continue;
            }
            self.validate(&filter.value).map_err(|mut err| {
                let base = format!("/filters/{idx}/value");
                err.path = Some(match err.path.take() {
                    Some(inner) => format!("{base}{inner}"),
                    None => base,
                });
                err
            })?;
        }
        Ok(())
    }

    fn walk(&self, root: &Value) -> Result<(), ValidationError> {
        let mut stack: Vec<(&Value, String)> = vec![(root, String::new())];
        while let Some((value, path)) = stack.pop() {
            match value {
                Value::Null => return Err(missing().at(&path)),
                Value::String(s) => {
                    if utf16_len_exceeds(s, self.options.max_string_length) {
                        return Err(ValidationError::new(
                            ValidationKind::TooLong,
                            format!(
                                "Value length exceeds maximum of {}",
                                self.options.max_string_length
                            ),
                        )
                        .at(&path));
                    }
                }
                Value::Array(items) => {
                    if items.is_empty() {
                        return Err(ValidationError::new(
                            ValidationKind::EmptyArray,
                            "Empty arrays not supported",
                        )
                        .at(&path));
                    }
                    for (idx, item) in items.iter().enumerate().rev() {
                        stack.push((item, format!("{path}/{idx}")));
                    }
                }
                Value::Object(map) => {
                    if let Some(key) = map.keys().find(|k| is_denied_key(k)) {
                        tracing::warn!(key = %key, "rejecting object with a denied key");
                        return Err(ValidationError::new(ValidationKind::Injection, INJECTION_MESSAGE)
                            .at(&path));
                    }
                    for (key, child) in map.iter().rev() {
                        stack.push((child, format!("{path}/{}", escape_pointer(key))));
                    }
                }
                Value::Bool(_) | Value::Number(_) => {}
            }
        }
        Ok(())
    }
}

/// Validate a value with the default options.
///
/// Null (the Rust rendering of "missing") is rejected, as are injection
/// patterns, strings over [`MAX_STRING_LENGTH`], and empty arrays anywhere in
/// the structure.
pub fn validate_value(value: &Value) -> Result<(), ValidationError> {
    ValueValidator::default().validate(value)
}

/// Validate all filters with the default options.
pub fn validate_filters(filters: &[FilterQuery]) -> Result<(), ValidationError> {
    ValueValidator::default().validate_filters(filters)
}

fn missing() -> ValidationError {
    ValidationError::new(ValidationKind::Missing, "Value cannot be null or undefined")
}

fn check_depth(root: &Value, max_depth: usize) -> Result<(), ValidationError> {
    let mut stack = vec![(root, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(ValidationError::new(
                ValidationKind::TooDeep,
                format!("Value nesting exceeds maximum depth of {max_depth}"),
            ));
        }
        match value {
            Value::Array(items) => stack.extend(items.iter().map(|v| (v, depth + 1))),
            Value::Object(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
            _ => {}
        }
    }
    Ok(())
}

fn contains_denied_token(haystack: &str) -> bool {
    let lowered = haystack.to_lowercase();
    DENY_LIST
        .iter()
        .any(|token| lowered.contains(&token.to_lowercase()))
}

fn is_denied_key(key: &str) -> bool {
    DENY_LIST.iter().any(|token| token.eq_ignore_ascii_case(key))
}

// UTF-8 byte length bounds the UTF-16 length from above, so short strings
// skip the count.
fn utf16_len_exceeds(s: &str, max: usize) -> bool {
    s.len() > max && s.encode_utf16().count() > max
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
