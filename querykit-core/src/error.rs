/// Category of a [`ValidationError`], for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// A value was null or missing.
    Missing,
    /// A deny-listed operator token or prototype key was found.
    Injection,
    /// A string exceeded the maximum length.
    TooLong,
    /// An array had no elements.
    EmptyArray,
    /// The value nested deeper than the validator allows.
    TooDeep,
    /// A pagination field was not representable as an integer.
    NotInteger,
}

/// Input rejected by the value validator or the strict pagination check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
    /// Location of the offending node inside the validated value (`/a/0/b`),
    /// `None` when the root itself was rejected.
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub(crate) fn at(mut self, path: &str) -> Self {
        if !path.is_empty() {
            self.path = Some(path.to_string());
        }
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} (at {path})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by a query fetch.
///
/// Only `Validation` originates in this crate. `Expression` and `Upstream`
/// come from the injected collaborators and are returned as-is.
#[derive(Debug)]
pub enum QueryError {
    Validation(ValidationError),
    /// The expression builder could not express a filter for its store.
    Expression(String),
    /// Store-specific failure (network, auth, timeout, driver error).
    Upstream(Box<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    /// Construct an `Upstream` variant from any error type.
    ///
    /// Used by backend crates (e.g. `querykit-sql`) to wrap driver-specific errors.
    pub fn upstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        QueryError::Upstream(Box::new(err))
    }

    pub fn expression(msg: impl Into<String>) -> Self {
        QueryError::Expression(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, QueryError::Validation(_))
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Validation(err) => write!(f, "Validation error: {err}"),
            QueryError::Expression(msg) => write!(f, "Expression error: {msg}"),
            QueryError::Upstream(err) => write!(f, "Upstream error: {err}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Validation(err) => Some(err),
            QueryError::Upstream(err) => Some(err.as_ref()),
            QueryError::Expression(_) => None,
        }
    }
}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        QueryError::Validation(err)
    }
}
