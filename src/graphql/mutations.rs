use async_graphql::*;

use crate::error::AppError;
use crate::graphql::request_data;
use crate::moments::interactions;
use crate::moments::model::CounterResponse;

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn like_moment(&self, ctx: &Context<'_>, moment_id: String) -> Result<CounterResponse> {
        let (pool, _, user) = request_data(ctx)?;
        let mut conn = pool.get()?;
        interactions::like_moment(&mut conn, user, &moment_id).map_err(AppError::into_graphql)
    }

    async fn unlike_moment(&self, ctx: &Context<'_>, moment_id: String) -> Result<CounterResponse> {
        let (pool, _, user) = request_data(ctx)?;
        let mut conn = pool.get()?;
        interactions::unlike_moment(&mut conn, user, &moment_id).map_err(AppError::into_graphql)
    }

    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        moment_id: String,
        comment: String,
    ) -> Result<CounterResponse> {
        let (pool, cfg, user) = request_data(ctx)?;
        let mut conn = pool.get()?;
        interactions::add_comment(&mut conn, cfg, user, &moment_id, &comment)
            .map_err(AppError::into_graphql)
    }

    async fn share_moment(&self, ctx: &Context<'_>, moment_id: String) -> Result<CounterResponse> {
        let (pool, _, user) = request_data(ctx)?;
        let mut conn = pool.get()?;
        interactions::share_moment(&mut conn, user, &moment_id).map_err(AppError::into_graphql)
    }
}
