//! Mutation payloads and mutation factories

pub mod delete;
pub mod dynamic;

pub use delete::{AdditionalActions, CheckPermissions, DeletableModel, DeleteMutation, DeleteTarget};
pub use dynamic::{DynamicMutation, MutationRegistry};

use async_graphql::SimpleObject;

use crate::pipeline::Payload;
use crate::validation::ErrorField;

/// Uniform mutation result: `success` plus the field errors that caused a failure
#[derive(SimpleObject, Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationPayload {
    /// Whether the mutation succeeded
    pub success: bool,
    /// Field errors
    pub errors: Vec<ErrorField>,
}

impl MutationPayload {
    pub fn ok() -> Self {
        Self::from_success(true)
    }

    pub fn from_success(success: bool) -> Self {
        Self {
            success,
            errors: Vec::new(),
        }
    }
}

impl Payload for MutationPayload {
    fn failure(errors: Vec<ErrorField>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}
