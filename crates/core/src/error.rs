//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Two business kinds matter to callers: guard violations (an action is not
/// allowed in the current state) and constraint violations (the written data
/// breaks an integrity rule). Both are synchronous and leave state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A user-actionable precondition blocked the action
    /// (e.g. selling a cancelled property, accepting a second offer).
    #[error("guard violation: {0}")]
    GuardViolation(String),

    /// A data-integrity rule failed on write (e.g. non-positive price, duplicate name).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found (or has been deleted).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (record already exists, stale version).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn guard(msg: impl Into<String>) -> Self {
        Self::GuardViolation(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn is_guard(&self) -> bool {
        matches!(self, Self::GuardViolation(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}
