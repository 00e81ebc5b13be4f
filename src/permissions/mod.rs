//! Permission predicates
//!
//! A [`Permission`] answers two questions: may the request run the mutation
//! at all, and may it act on a concrete record. Both default to `true`, so a
//! predicate only overrides the check it cares about. Predicates are grouped
//! in a [`PermissionSet`], which passes only when every member passes.

mod guard;

pub use guard::PermissionGuard;

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use crate::auth::RequestContext;
use crate::errors::{MutationError, MutationResult};

pub trait Permission: Send + Sync {
    fn has_permission(&self, _ctx: &RequestContext) -> bool {
        true
    }

    fn has_object_permission(&self, _ctx: &RequestContext, _object: &dyn Any) -> bool {
        true
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Lets everybody through
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAny;

impl Permission for AllowAny {
    fn name(&self) -> &str {
        "AllowAny"
    }
}

/// Only authenticated users
#[derive(Clone, Copy, Debug, Default)]
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        ctx.actor.is_authenticated()
    }

    fn name(&self) -> &str {
        "IsAuthenticated"
    }
}

/// Only anonymous users
#[derive(Clone, Copy, Debug, Default)]
pub struct IsGuest;

impl Permission for IsGuest {
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        !ctx.actor.is_authenticated()
    }

    fn name(&self) -> &str {
        "IsGuest"
    }
}

/// Requires a model permission codename, e.g. `notes.delete_note`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelPermission {
    codename: String,
}

impl ModelPermission {
    pub fn new(codename: impl Into<String>) -> Self {
        Self {
            codename: codename.into(),
        }
    }

    pub fn codename(&self) -> &str {
        &self.codename
    }
}

impl Permission for ModelPermission {
    fn has_permission(&self, ctx: &RequestContext) -> bool {
        ctx.actor.has_perm(&self.codename)
    }

    fn name(&self) -> &str {
        &self.codename
    }
}

/// Records that belong to a user
pub trait Owned {
    fn owner_id(&self) -> Option<i32>;
}

/// Object-level check: the record must belong to the acting user.
/// Superusers pass; records of another type are denied.
pub struct IsOwner<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M> IsOwner<M> {
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M> Default for IsOwner<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Owned + 'static> Permission for IsOwner<M> {
    fn has_object_permission(&self, ctx: &RequestContext, object: &dyn Any) -> bool {
        if ctx.actor.is_superuser() {
            return true;
        }
        match object.downcast_ref::<M>() {
            Some(record) => record.owner_id().is_some() && record.owner_id() == ctx.user_id(),
            None => false,
        }
    }

    fn name(&self) -> &str {
        "IsOwner"
    }
}

/// Ordered collection of permission predicates combined with logical AND
#[derive(Clone, Default)]
pub struct PermissionSet {
    permissions: Vec<Arc<dyn Permission>>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, permission: impl Permission + 'static) -> Self {
        self.permissions.push(Arc::new(permission));
        self
    }

    pub fn with_shared(mut self, permission: Arc<dyn Permission>) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.permissions.iter().map(|p| p.name()).collect()
    }

    /// Every predicate is evaluated, the result is their conjunction
    pub fn check(&self, ctx: &RequestContext) -> bool {
        self.permissions
            .iter()
            .map(|permission| {
                let allowed = permission.has_permission(ctx);
                if !allowed {
                    warn!(permission = permission.name(), user_id = ?ctx.user_id(), "permission denied");
                }
                allowed
            })
            .fold(true, |acc, allowed| acc && allowed)
    }

    pub fn check_object(&self, ctx: &RequestContext, object: &dyn Any) -> bool {
        self.permissions
            .iter()
            .map(|permission| {
                let allowed = permission.has_object_permission(ctx, object);
                if !allowed {
                    warn!(permission = permission.name(), user_id = ?ctx.user_id(), "object permission denied");
                }
                allowed
            })
            .fold(true, |acc, allowed| acc && allowed)
    }

    pub fn ensure(&self, ctx: &RequestContext) -> MutationResult<()> {
        if self.check(ctx) {
            Ok(())
        } else {
            Err(MutationError::permission_denied())
        }
    }
}

impl fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Object-level permission capability handed to a mutation body after the
/// request-level checks passed.
#[derive(Clone, Debug)]
pub struct ObjectPermissionCheck {
    permissions: PermissionSet,
    ctx: RequestContext,
}

impl ObjectPermissionCheck {
    pub fn new(permissions: PermissionSet, ctx: RequestContext) -> Self {
        Self { permissions, ctx }
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn check(&self, object: &dyn Any) -> MutationResult<()> {
        if self.permissions.check_object(&self.ctx, object) {
            Ok(())
        } else {
            Err(MutationError::permission_denied())
        }
    }
}
