//! Audit-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidRequest | 400 |
//! | IdentityMismatch | 401 |
//! | QuotaExceeded | 403 |
//! | NotFound | 404 |
//! | EngineFailed | 500 |
//! | Storage | 500 |

use crate::domain::foundation::{AuditId, DomainError, ErrorCode, ValidationError};

/// Errors surfaced by the audit pipeline and lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// Missing or malformed input.
    InvalidRequest { field: String, message: String },

    /// The claimed identity does not belong to the caller.
    IdentityMismatch,

    /// The caller has used every audit in the current period.
    QuotaExceeded { used: i32, limit: i32 },

    /// No result exists under this id (or it has expired).
    NotFound(AuditId),

    /// The scoring engine could not produce a result.
    EngineFailed(String),

    /// Storage failed while reserving quota or saving the result.
    Storage(String),
}

impl AuditError {
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        AuditError::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn quota_exceeded(used: i32, limit: i32) -> Self {
        AuditError::QuotaExceeded { used, limit }
    }

    pub fn not_found(id: AuditId) -> Self {
        AuditError::NotFound(id)
    }

    pub fn engine_failed(message: impl Into<String>) -> Self {
        AuditError::EngineFailed(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        AuditError::Storage(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AuditError::InvalidRequest { .. } => ErrorCode::ValidationFailed,
            AuditError::IdentityMismatch => ErrorCode::Unauthorized,
            AuditError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            AuditError::NotFound(_) => ErrorCode::AuditNotFound,
            AuditError::EngineFailed(_) => ErrorCode::AuditEngineError,
            AuditError::Storage(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            AuditError::InvalidRequest { field, message } => {
                format!("Invalid '{}': {}", field, message)
            }
            AuditError::IdentityMismatch => "User does not match the signed-in account".to_string(),
            AuditError::QuotaExceeded { used, limit } => format!(
                "Audit limit reached ({} of {} used). Upgrade your plan to run more audits.",
                used, limit
            ),
            AuditError::NotFound(id) => format!("Audit not found: {}", id),
            AuditError::EngineFailed(_) => "Audit could not be completed".to_string(),
            AuditError::Storage(_) => "Audit result could not be saved".to_string(),
        }
    }

    /// True for errors the caller can fix by upgrading their plan.
    pub fn requires_upgrade(&self) -> bool {
        matches!(self, AuditError::QuotaExceeded { .. })
    }
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditError::EngineFailed(detail) | AuditError::Storage(detail) => {
                write!(f, "{} ({})", self.message(), detail)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for AuditError {}

impl From<ValidationError> for AuditError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::OutOfRange { field, .. } => field.clone(),
        };
        AuditError::InvalidRequest {
            field,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for AuditError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::AuditEngineError => AuditError::EngineFailed(err.message),
            _ => AuditError::Storage(err.to_string()),
        }
    }
}
