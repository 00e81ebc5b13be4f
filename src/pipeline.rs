//! Mutation decoration pipeline
//!
//! [`MutationPipeline`] wraps a mutation body with, in this order:
//!
//! 1. the permission set - any denial aborts with `PermissionDenied` before
//!    anything else happens;
//! 2. the resolve models, applied left to right to the arguments;
//! 3. the validators - immediately, or deferred until the body asks for them;
//! 4. the user counters registered with [`MutationPipeline::register_users`].
//!
//! The body receives a [`MutationScope`] carrying the resolved arguments, the
//! object-level permission check and, in deferred mode, the validation
//! trigger. A [`MutationError::Validation`] returned by the body is turned into
//! the failure payload of the mutation.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::arguments::Arguments;
use crate::auth::RequestContext;
use crate::cache::UserRegistry;
use crate::errors::{MutationError, MutationResult, ToGraphQLError};
use crate::permissions::{ObjectPermissionCheck, Permission, PermissionSet};
use crate::resolve::ResolveModel;
use crate::validation::{ErrorField, ValidationData, Validator, ValidatorEntry, ValidatorSet};

/// Result type of a mutation that can report field errors
pub trait Payload: Sized {
    /// The `{ success: false, errors }` shape
    fn failure(errors: Vec<ErrorField>) -> Self;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Validate before the body runs
    #[default]
    Immediate,
    /// Hand the body a trigger to validate at a point of its choosing
    Deferred,
}

/// Validation trigger handed to the body in deferred mode
#[derive(Clone)]
pub struct DeferredValidation {
    validators: ValidatorSet,
    data: ValidationData,
}

impl DeferredValidation {
    pub fn errors(&self) -> Vec<ErrorField> {
        self.validators.errors(&self.data)
    }

    /// Validate the mutation arguments
    pub fn validate(&self) -> MutationResult<()> {
        self.validate_data(&self.data)
    }

    /// Validate data assembled by the body instead of the arguments
    pub fn validate_data(&self, data: &ValidationData) -> MutationResult<()> {
        let errors = self.validators.errors(data);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MutationError::Validation(errors))
        }
    }
}

/// Capabilities available to a mutation body
pub struct MutationScope {
    args: Arguments,
    objects: ObjectPermissionCheck,
    validation: Option<DeferredValidation>,
}

impl MutationScope {
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn into_args(self) -> Arguments {
        self.args
    }

    pub fn context(&self) -> &RequestContext {
        self.objects.context()
    }

    pub fn object_permissions(&self) -> &ObjectPermissionCheck {
        &self.objects
    }

    /// Run the object-level checks of the pipeline's permission set
    pub fn check_object(&self, object: &dyn Any) -> MutationResult<()> {
        self.objects.check(object)
    }

    pub fn is_deferred(&self) -> bool {
        self.validation.is_some()
    }

    /// Deferred validation of the arguments; a no-op when validation already
    /// ran before the body.
    pub fn validate(&self) -> MutationResult<()> {
        match &self.validation {
            Some(validation) => validation.validate(),
            None => Ok(()),
        }
    }

    pub fn validate_data(&self, data: &ValidationData) -> MutationResult<()> {
        match &self.validation {
            Some(validation) => validation.validate_data(data),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct Registration {
    registry: UserRegistry,
    key: String,
    delete: bool,
}

/// Declarative decoration of a mutation body
#[derive(Clone, Default)]
pub struct MutationPipeline {
    permissions: PermissionSet,
    resolvers: Vec<Arc<dyn ResolveModel>>,
    validators: ValidatorSet,
    mode: ValidationMode,
    registrations: Vec<Registration>,
}

impl MutationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn permission(mut self, permission: impl Permission + 'static) -> Self {
        self.permissions = self.permissions.with(permission);
        self
    }

    pub fn resolve(mut self, resolver: impl ResolveModel + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn validators(mut self, validators: ValidatorSet) -> Self {
        self.validators = validators;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators = self.validators.with(validator);
        self
    }

    pub fn validator_entry(mut self, entry: ValidatorEntry) -> Self {
        self.validators = self.validators.with_entry(entry);
        self
    }

    pub fn deferred(mut self) -> Self {
        self.mode = ValidationMode::Deferred;
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Count invocations per user in `key`; `delete` decrements instead
    pub fn register_users(mut self, registry: UserRegistry, key: impl Into<String>, delete: bool) -> Self {
        self.registrations.push(Registration {
            registry,
            key: key.into(),
            delete,
        });
        self
    }

    /// Run `body` under the configured permissions, resolve models and validators
    pub async fn run<P, F, Fut>(&self, ctx: &RequestContext, args: Arguments, body: F) -> MutationResult<P>
    where
        P: Payload,
        F: FnOnce(MutationScope) -> Fut,
        Fut: Future<Output = MutationResult<P>>,
    {
        self.permissions.ensure(ctx)?;
        debug!(permissions = ?self.permissions, "permission checks passed");

        let mut args = args;
        for resolver in &self.resolvers {
            args = resolver.resolve(ctx, args).await?;
        }

        let validation = if self.validators.is_empty() {
            None
        } else {
            Some(DeferredValidation {
                validators: self.validators.clone(),
                data: args.validation_data(),
            })
        };

        let validation = match (self.mode, validation) {
            (ValidationMode::Immediate, Some(validation)) => {
                let errors = validation.errors();
                if !errors.is_empty() {
                    debug!(errors = errors.len(), "validation failed before mutation body");
                    return Ok(P::failure(errors));
                }
                None
            }
            (ValidationMode::Deferred, validation) => validation,
            (ValidationMode::Immediate, None) => None,
        };

        for registration in &self.registrations {
            registration
                .registry
                .track(&registration.key, ctx.user_id(), registration.delete)
                .await;
        }

        let scope = MutationScope {
            args,
            objects: ObjectPermissionCheck::new(self.permissions.clone(), ctx.clone()),
            validation,
        };

        match body(scope).await {
            Err(MutationError::Validation(errors)) => {
                debug!(errors = errors.len(), "mutation body reported validation errors");
                Ok(P::failure(errors))
            }
            other => other,
        }
    }

    /// [`MutationPipeline::run`] for a resolver: the request context comes from
    /// the GraphQL data and errors become GraphQL errors.
    pub async fn run_graphql<P, F, Fut>(
        &self,
        ctx: &async_graphql::Context<'_>,
        args: Arguments,
        body: F,
    ) -> async_graphql::Result<P>
    where
        P: Payload,
        F: FnOnce(MutationScope) -> Fut,
        Fut: Future<Output = MutationResult<P>>,
    {
        let request = RequestContext::from_graphql(ctx);
        self.run(&request, args, body)
            .await
            .map_err(|err| err.to_graphql_error())
    }
}
