use std::collections::BTreeSet;

/// The user a request acts on behalf of
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Actor {
    pub user_id: Option<i32>,
    roles: BTreeSet<String>,
    scopes: BTreeSet<String>,
}

impl Actor {
    pub fn user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            roles: BTreeSet::new(),
            scopes: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Grant a model permission codename such as `notes.delete_note`
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Superusers hold every model permission
    pub fn is_superuser(&self) -> bool {
        self.is_authenticated() && self.has_role("admin")
    }

    pub fn has_perm(&self, codename: &str) -> bool {
        self.is_authenticated() && (self.is_superuser() || self.has_scope(codename))
    }
}

/// Per-request context the permission predicates are evaluated against.
///
/// Inserted into the async-graphql request data by the HTTP layer.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub actor: Actor,
}

impl RequestContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<i32> {
        self.actor.user_id
    }

    /// Fetch the request context from GraphQL data, anonymous when absent
    pub fn from_graphql(ctx: &async_graphql::Context<'_>) -> Self {
        ctx.data_opt::<RequestContext>().cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_permissions() {
        let actor = Actor::anonymous().with_scope("notes.delete_note");
        assert!(!actor.is_authenticated());
        assert!(!actor.has_perm("notes.delete_note"));
    }

    #[test]
    fn test_superuser_has_every_permission() {
        let actor = Actor::user(1).with_role("admin");
        assert!(actor.is_superuser());
        assert!(actor.has_perm("notes.delete_note"));
    }

    #[test]
    fn test_scoped_permission() {
        let actor = Actor::user(2).with_scope("notes.delete_note");
        assert!(actor.has_perm("notes.delete_note"));
        assert!(!actor.has_perm("notes.change_note"));
    }
}
