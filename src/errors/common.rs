//! GraphQL conversion of [`MutationError`]
//!
//! ```rust
//! use mutation_guard::errors::{MutationError, ToGraphQLError};
//!
//! let err = MutationError::not_found().to_graphql_error();
//! assert_eq!(err.message, "The requested record was not found");
//! ```

use async_graphql::{Error as GraphQLError, ErrorExtensions};

use super::MutationError;

/// Convert domain errors to GraphQL errors with error codes
pub trait ToGraphQLError {
    /// Convert to GraphQL error with structured extensions
    fn to_graphql_error(&self) -> GraphQLError;
}

impl ToGraphQLError for MutationError {
    fn to_graphql_error(&self) -> GraphQLError {
        let code = self.code();
        let status = self.status();

        GraphQLError::new(self.to_string()).extend_with(|_, e| {
            e.set("code", code);
            e.set("status", status);

            match self {
                MutationError::Validation(errors) => {
                    let fields: Vec<String> = errors.iter().map(|err| err.field.clone()).collect();
                    e.set("fields", fields);
                }
                MutationError::InvalidArgument { name, .. } => {
                    e.set("argument", name.as_str());
                }
                _ => {}
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    #[test]
    fn test_permission_denied_extensions() {
        let err = MutationError::permission_denied().to_graphql_error();
        let extensions = err.extensions.expect("extensions are set");
        assert_eq!(
            extensions.get("code"),
            Some(&Value::from("PERMISSION_DENIED"))
        );
        assert_eq!(extensions.get("status"), Some(&Value::from(403)));
    }

    #[test]
    fn test_message_is_kept() {
        let err = MutationError::not_found_multiple().to_graphql_error();
        assert_eq!(err.message, "The requested records were not found");
    }
}
