use async_graphql::{EmptySubscription, Schema};

use super::context::DemoContext;
use super::mutations::Mutation;
use super::queries::Query;

pub type DemoSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema(context: DemoContext) -> DemoSchema {
    Schema::build(Query, Mutation::default(), EmptySubscription)
        .data(context)
        .finish()
}
