use async_graphql::{Context, Object, Result, ID};
use sea_orm::{ActiveModelTrait, Set};
use tracing::info;

use crate::arguments::Arguments;
use crate::auth::RequestContext;
use crate::demo::context::DemoContext;
use crate::demo::entities::users;
use crate::demo::types::{RegisterInput, User, UserPayload};
use crate::errors::{MutationError, ToGraphQLError};
use crate::mutations::{DeleteTarget, MutationPayload};
use crate::permissions::{IsAuthenticated, IsGuest, PermissionGuard, PermissionSet};
use crate::pipeline::MutationPipeline;
use crate::validation::RuleValidator;

#[derive(Default)]
pub struct AccountMutation;

#[Object]
impl AccountMutation {
    /// Create an account; only available to anonymous requests
    async fn register(&self, ctx: &Context<'_>, input: RegisterInput) -> Result<UserPayload> {
        let context = ctx.data::<DemoContext>()?;
        let rules = RuleValidator::from_rules([
            ("username", "required|min_length:3|max_length:40|regex:^[A-Za-z0-9_]+$"),
            ("email", "required|email"),
        ])
        .map_err(|err| MutationError::invalid_argument("rules", err.to_string()).to_graphql_error())?;
        let args = Arguments::from_input(&input).map_err(|err| err.to_graphql_error())?;

        MutationPipeline::new()
            .permission(IsGuest)
            .validator(rules)
            .run_graphql(ctx, args, |scope| async move {
                let mut user = users::ActiveModel::new();
                user.username = Set(scope.args().parse("username")?);
                user.email = Set(scope.args().parse("email")?);
                let user = user.insert(&context.db).await?;
                info!(user = user.id, "registered user");
                Ok(UserPayload {
                    success: true,
                    errors: Vec::new(),
                    user: Some(User::from(user)),
                })
            })
            .await
    }

    /// Count a session of the current user
    async fn sign_in(&self, ctx: &Context<'_>) -> Result<MutationPayload> {
        let context = ctx.data::<DemoContext>()?;
        MutationPipeline::new()
            .permission(IsAuthenticated)
            .register_users(context.registry.clone(), context.registration_key.clone(), false)
            .run_graphql(ctx, Arguments::new(), |_| async { Ok(MutationPayload::ok()) })
            .await
    }

    /// Release a session of the current user
    #[graphql(guard = "PermissionGuard::new(PermissionSet::new().with(IsAuthenticated))")]
    async fn sign_out(&self, ctx: &Context<'_>) -> Result<MutationPayload> {
        let context = ctx.data::<DemoContext>()?;
        MutationPipeline::new()
            .register_users(context.registry.clone(), context.registration_key.clone(), true)
            .run_graphql(ctx, Arguments::new(), |_| async { Ok(MutationPayload::ok()) })
            .await
    }

    async fn delete_user(&self, ctx: &Context<'_>, user_id: ID) -> Result<MutationPayload> {
        let context = ctx.data::<DemoContext>()?;
        let request = RequestContext::from_graphql(ctx);
        Ok(context
            .delete_user
            .execute(&request, DeleteTarget::One(user_id.to_string()))
            .await
            .map_err(|err| err.to_graphql_error())?)
    }
}
