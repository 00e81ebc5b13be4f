mod accounts;
mod notes;

use async_graphql::MergedObject;

#[derive(Default, MergedObject)]
pub struct Mutation(pub notes::NoteMutation, pub accounts::AccountMutation);
