//! Structured operation outcome.
//!
//! Services hand callers a success flag plus either data or a typed error
//! description instead of raising. Route handlers serialise the outcome as-is
//! and pick an HTTP status from `OutcomeError::kind`.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Error category carried by a failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InvalidId,
    NotFound,
    Conflict,
    InvalidState,
    Invariant,
    Unauthorized,
    Forbidden,
    Storage,
    /// An external dependency (analytics backend) failed.
    Upstream,
}

impl ErrorKind {
    /// Wire code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::InvalidId => "invalid_id",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Invariant => "invariant_violation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Storage => "storage_error",
            ErrorKind::Upstream => "upstream_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OutcomeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<DomainError> for OutcomeError {
    fn from(err: DomainError) -> Self {
        let kind = match &err {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::InvalidId(_) => ErrorKind::InvalidId,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::InvalidState(_) => ErrorKind::InvalidState,
            DomainError::InvariantViolation(_) => ErrorKind::Invariant,
            DomainError::Unauthorized => ErrorKind::Unauthorized,
        };
        Self::new(kind, err.to_string())
    }
}

/// `{ success, data | error }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<OutcomeError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.success
    }

    /// Convert back into a `Result` for callers that want `?`.
    pub fn into_result(self) -> Result<T, OutcomeError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(err)) => Err(err),
            (None, None) => Err(OutcomeError::new(ErrorKind::Invariant, "empty outcome")),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: Into<OutcomeError>,
{
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(data) => Outcome::ok(data),
            Err(e) => Outcome::fail(e),
        }
    }
}
