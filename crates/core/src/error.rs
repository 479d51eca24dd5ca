//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts, lifecycle violations). Infrastructure concerns belong
/// elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or missing input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (or is not visible from the active store).
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflicting resource already exists (e.g. duplicate SKU, second open shift).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The entity exists but is not in a state that allows the operation
    /// (e.g. closing an already-closed shift).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable machine-readable code, shared by JSON error bodies and outcomes.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::Unauthorized => "unauthorized",
        }
    }
}

/// Shared non-empty check used by entity constructors and patches.
pub fn require_non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Shared non-negative amount check.
pub fn require_non_negative(field: &str, value: i64) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_is_distinct_from_not_found_and_conflict() {
        let e = DomainError::invalid_state("shift is closed");
        assert_eq!(e.code(), "invalid_state");
        assert_ne!(e.code(), DomainError::not_found("shift").code());
        assert_ne!(e.code(), DomainError::conflict("shift").code());
    }

    #[test]
    fn helpers_reject_blank_and_negative_values() {
        assert!(require_non_empty("name", "  ").is_err());
        assert!(require_non_empty("name", "Kopi").is_ok());
        assert!(require_non_negative("price", -1).is_err());
        assert!(require_non_negative("price", 0).is_ok());
    }
}
