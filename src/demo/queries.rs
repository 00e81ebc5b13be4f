use async_graphql::{Context, Object, Result, ID};
use sea_orm::{EntityTrait, QueryOrder};

use super::context::DemoContext;
use super::entities::notes;
use super::types::Note;
use crate::auth::RequestContext;
use crate::errors::{MutationError, ToGraphQLError};
use crate::orm::{get_object_or_none, parse_primary_key};

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    async fn notes(&self, ctx: &Context<'_>) -> Result<Vec<Note>> {
        let context = ctx.data::<DemoContext>()?;
        let notes = notes::Entity::find()
            .order_by_asc(notes::Column::Id)
            .all(&context.db)
            .await
            .map_err(|err| MutationError::from(err).to_graphql_error())?;
        Ok(notes.into_iter().map(Note::from).collect())
    }

    async fn note(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Note>> {
        let context = ctx.data::<DemoContext>()?;
        let id = parse_primary_key::<notes::Entity>(&id, true).map_err(|err| err.to_graphql_error())?;
        let note = get_object_or_none::<notes::Entity, _>(&context.db, id)
            .await
            .map_err(|err| err.to_graphql_error())?;
        Ok(note.map(Note::from))
    }

    /// How often the current user is registered under the configured key
    async fn registration_count(&self, ctx: &Context<'_>) -> Result<Option<i64>> {
        let context = ctx.data::<DemoContext>()?;
        let Some(user_id) = RequestContext::from_graphql(ctx).user_id() else {
            return Ok(None);
        };
        Ok(context
            .registry
            .count(&context.registration_key, user_id)
            .await)
    }
}
