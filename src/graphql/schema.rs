use async_graphql::{EmptySubscription, Schema};

use super::mutations::MutationRoot;
use super::queries::QueryRoot;

/// GraphQL Schema type
pub type MomentsSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema
pub fn build_schema() -> MomentsSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}
