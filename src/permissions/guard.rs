use async_graphql::{Context, Guard, Result};

use super::PermissionSet;
use crate::auth::RequestContext;
use crate::errors::{MutationError, ToGraphQLError};

/// Applies a [`PermissionSet`] to a statically declared field:
///
/// ```rust,ignore
/// #[graphql(guard = "PermissionGuard::new(PermissionSet::new().with(IsAuthenticated))")]
/// async fn archive(&self, ctx: &Context<'_>) -> Result<bool> { ... }
/// ```
pub struct PermissionGuard {
    permissions: PermissionSet,
}

impl PermissionGuard {
    pub fn new(permissions: PermissionSet) -> Self {
        Self { permissions }
    }
}

impl Guard for PermissionGuard {
    async fn check(&self, ctx: &Context<'_>) -> Result<()> {
        let request = RequestContext::from_graphql(ctx);
        if self.permissions.check(&request) {
            Ok(())
        } else {
            Err(MutationError::permission_denied().to_graphql_error())
        }
    }
}
