use thiserror::Error;

use tillpoint_ai::AiError;
use tillpoint_auth::{AuthzError, PasswordError};
use tillpoint_core::{DomainError, ErrorKind, OutcomeError};

/// Repository-level failure.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Uniqueness or referential constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Service-level failure, mapped onto `OutcomeError` at the boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(e) => OutcomeError::from(e.clone()).kind,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::Storage(_) => ErrorKind::Storage,
            ServiceError::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => ServiceError::Domain(DomainError::Conflict(msg)),
            RepoError::Storage(msg) => {
                tracing::error!(error = %msg, "storage failure");
                ServiceError::Storage(msg)
            }
            RepoError::Domain(e) => ServiceError::Domain(e),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        let message = err.to_string();
        match err {
            PasswordError::TooShort => ServiceError::Domain(DomainError::Validation(message)),
            PasswordError::Hash(_) => ServiceError::Storage(message),
        }
    }
}

impl From<AiError> for ServiceError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::InvalidInput(msg) => ServiceError::Domain(DomainError::Validation(msg)),
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

impl From<ServiceError> for OutcomeError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => OutcomeError::from(e),
            other => OutcomeError::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_conflict_surfaces_as_domain_conflict() {
        let err: ServiceError = RepoError::Conflict("sku taken".into()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn forbidden_keeps_its_own_kind() {
        let outcome: OutcomeError = ServiceError::Forbidden("not your shift".into()).into();
        assert_eq!(outcome.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn invalid_state_is_distinct_from_conflict() {
        let err = ServiceError::from(DomainError::invalid_state("closed"));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
