//! Error types for the mutation helpers
//!
//! Every fallible operation in this crate returns [`MutationError`]. Permission
//! and lookup failures terminate the resolution of a GraphQL field, while
//! validation failures are caught by the pipeline and folded into the uniform
//! `{ success: false, errors: [...] }` payload.
//!
//! # Examples
//!
//! ```rust
//! use mutation_guard::errors::MutationError;
//!
//! let err = MutationError::PermissionDenied(None);
//! assert_eq!(err.status(), 403);
//! assert_eq!(err.code(), "PERMISSION_DENIED");
//! ```

pub mod common;

pub use common::ToGraphQLError;

use thiserror::Error;

use crate::validation::ErrorField;

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action";
pub const NOT_FOUND_MESSAGE: &str = "The requested record was not found";
pub const NOT_FOUND_MULTIPLE_MESSAGE: &str = "The requested records were not found";

/// Errors raised while decorating or executing a mutation
#[derive(Error, Debug)]
pub enum MutationError {
    /// A permission predicate denied the request
    #[error("{}", .0.as_deref().unwrap_or(PERMISSION_DENIED_MESSAGE))]
    PermissionDenied(Option<String>),

    /// A single record could not be resolved
    #[error("{}", .0.as_deref().unwrap_or(NOT_FOUND_MESSAGE))]
    NotFound(Option<String>),

    /// At least one of several requested records could not be resolved
    #[error("{}", .0.as_deref().unwrap_or(NOT_FOUND_MULTIPLE_MESSAGE))]
    NotFoundMultiple(Option<String>),

    /// Aggregated field errors
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<ErrorField>),

    /// Malformed global identifier
    #[error("Invalid global id: {0}")]
    InvalidGlobalId(String),

    /// Argument missing or of the wrong shape
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Counter store operation failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MutationError {
    pub fn permission_denied() -> Self {
        MutationError::PermissionDenied(None)
    }

    pub fn not_found() -> Self {
        MutationError::NotFound(None)
    }

    pub fn not_found_multiple() -> Self {
        MutationError::NotFoundMultiple(None)
    }

    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MutationError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Replace the default message of a permission or lookup error
    pub fn with_message(self, message: impl Into<String>) -> Self {
        match self {
            MutationError::PermissionDenied(_) => MutationError::PermissionDenied(Some(message.into())),
            MutationError::NotFound(_) => MutationError::NotFound(Some(message.into())),
            MutationError::NotFoundMultiple(_) => {
                MutationError::NotFoundMultiple(Some(message.into()))
            }
            other => other,
        }
    }

    /// HTTP-equivalent status code
    pub fn status(&self) -> u16 {
        match self {
            MutationError::PermissionDenied(_) => 403,
            MutationError::NotFound(_) | MutationError::NotFoundMultiple(_) => 404,
            MutationError::Validation(_)
            | MutationError::InvalidGlobalId(_)
            | MutationError::InvalidArgument { .. } => 400,
            MutationError::Database(_) | MutationError::Cache(_) | MutationError::Io(_) => 500,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            MutationError::PermissionDenied(_) => "PERMISSION_DENIED",
            MutationError::NotFound(_) => "NOT_FOUND",
            MutationError::NotFoundMultiple(_) => "NOT_FOUND_MULTIPLE",
            MutationError::Validation(_) => "VALIDATION_FAILED",
            MutationError::InvalidGlobalId(_) | MutationError::InvalidArgument { .. } => {
                "BAD_REQUEST"
            }
            MutationError::Database(_) => "DATABASE_ERROR",
            MutationError::Cache(_) => "CACHE_ERROR",
            MutationError::Io(_) => "IO_ERROR",
        }
    }

    /// Validation errors are folded into a failure payload instead of propagating
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MutationError::Validation(_))
    }
}

/// Result type alias for mutation helpers
pub type MutationResult<T> = Result<T, MutationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        assert_eq!(
            MutationError::permission_denied().to_string(),
            PERMISSION_DENIED_MESSAGE
        );
        assert_eq!(MutationError::not_found().to_string(), NOT_FOUND_MESSAGE);
        assert_eq!(
            MutationError::not_found_multiple().to_string(),
            NOT_FOUND_MULTIPLE_MESSAGE
        );
    }

    #[test]
    fn test_custom_message() {
        let err = MutationError::permission_denied().with_message("Access error");
        assert_eq!(err.to_string(), "Access error");
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(MutationError::not_found().status(), 404);
        assert_eq!(MutationError::not_found_multiple().status(), 404);
        assert_eq!(MutationError::Validation(vec![]).status(), 400);
        assert!(MutationError::Validation(vec![]).is_recoverable());
        assert!(!MutationError::permission_denied().is_recoverable());
    }
}
