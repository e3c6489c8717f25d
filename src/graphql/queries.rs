use async_graphql::*;

use crate::db::models::Hashtag;
use crate::error::AppError;
use crate::graphql::request_data;
use crate::moments::model::{MomentDetails, MomentSummary, Notification};
use crate::moments::{feed, hashtags, interactions, notifications};

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Published moments visible to the current user, newest first
    async fn feed(
        &self,
        ctx: &Context<'_>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MomentSummary>> {
        let (pool, cfg, user) = request_data(ctx)?;
        let conn = pool.get()?;
        feed::get_moment_feed(&conn, cfg, &user.id, limit, offset).map_err(AppError::into_graphql)
    }

    /// One moment with its comments and likes, or null if hidden or missing.
    /// Opening someone else's moment counts as a view.
    async fn moment(&self, ctx: &Context<'_>, moment_id: String) -> Result<Option<MomentDetails>> {
        let (pool, _, user) = request_data(ctx)?;
        let mut conn = pool.get()?;
        let viewed = interactions::record_view(&mut conn, &user.id, &moment_id)
            .and_then(|_| feed::get_moment_details(&conn, &user.id, &moment_id));
        match viewed {
            Ok(details) => Ok(Some(details)),
            Err(AppError::NotFound) => Ok(None),
            Err(e) => Err(e.into_graphql()),
        }
    }

    async fn notifications(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>> {
        let (pool, cfg, user) = request_data(ctx)?;
        let conn = pool.get()?;
        notifications::list_notifications(&conn, &user.id, unread_only, cfg.feed_limit(limit))
            .map_err(AppError::into_graphql)
    }

    async fn trending_hashtags(&self, ctx: &Context<'_>, limit: Option<i64>) -> Result<Vec<Hashtag>> {
        let (pool, cfg, _) = request_data(ctx)?;
        let conn = pool.get()?;
        Ok(hashtags::trending(&conn, cfg.feed_limit(limit))?)
    }
}
