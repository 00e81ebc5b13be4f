//! Cross-cutting helpers for async-graphql mutations backed by sea-orm:
//! permission predicates, resolve models, validators, the decoration pipeline
//! tying them together, a delete-mutation factory, per-user counters and
//! cleanup of orphaned uploaded files.

pub mod arguments;
pub mod auth;
pub mod cache;
pub mod config;
pub mod errors;
pub mod files;
pub mod mutations;
pub mod orm;
pub mod permissions;
pub mod pipeline;
pub mod resolve;
pub mod utils;
pub mod validation;

pub mod demo;

#[cfg(feature = "server")]
pub mod server;

pub use arguments::{Argument, Arguments, UploadedFile};
pub use auth::{Actor, RequestContext};
pub use errors::{MutationError, MutationResult};
pub use mutations::{DeletableModel, DeleteMutation, DeleteTarget, MutationPayload, MutationRegistry};
pub use permissions::{AllowAny, IsAuthenticated, IsGuest, IsOwner, ModelPermission, Permission, PermissionSet};
pub use pipeline::{MutationPipeline, MutationScope, Payload, ValidationMode};
pub use validation::{ErrorField, RuleValidator, Validator, ValidatorSet};
