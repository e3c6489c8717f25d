use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{ActivityEntry, Hashtag};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::moments::model::{
    CounterResponse, Moment, MomentDetails, MomentSummary, MomentUpdate, NewMoment,
};
use crate::moments::{activity, feed, hashtags, interactions, lifecycle};
use crate::state::AppState;

// --- Requests ---

#[derive(Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

#[derive(Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<i64>,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/moments", post(create_moment))
        .route("/api/moments/feed", get(moment_feed))
        .route(
            "/api/moments/{moment_id}",
            get(moment_details)
                .patch(update_moment)
                .delete(delete_moment),
        )
        .route(
            "/api/moments/{moment_id}/like",
            post(like_moment).delete(unlike_moment),
        )
        .route("/api/moments/{moment_id}/comments", post(add_comment))
        .route("/api/moments/{moment_id}/shares", post(share_moment))
        .route("/api/moments/{moment_id}/activity", get(moment_activity))
        .route("/api/hashtags/trending", get(trending_hashtags))
}

// --- Handlers ---

async fn create_moment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<NewMoment>,
) -> AppResult<(StatusCode, Json<Moment>)> {
    let mut conn = state.db.get()?;
    let moment = lifecycle::create_moment(&mut conn, state.config.moments(), &user, input)?;
    Ok((StatusCode::CREATED, Json(moment)))
}

async fn moment_feed(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<MomentSummary>>> {
    let conn = state.db.get()?;
    let moments = feed::get_moment_feed(
        &conn,
        state.config.moments(),
        &user.id,
        query.limit,
        query.offset,
    )?;
    Ok(Json(moments))
}

async fn moment_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
) -> AppResult<Json<MomentDetails>> {
    let mut conn = state.db.get()?;
    interactions::record_view(&mut conn, &user.id, &moment_id)?;
    let details = feed::get_moment_details(&conn, &user.id, &moment_id)?;
    Ok(Json(details))
}

async fn update_moment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
    Json(update): Json<MomentUpdate>,
) -> AppResult<Json<Moment>> {
    let mut conn = state.db.get()?;
    let moment =
        lifecycle::update_moment(&mut conn, state.config.moments(), &user, &moment_id, update)?;
    Ok(Json(moment))
}

async fn delete_moment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
) -> AppResult<StatusCode> {
    let mut conn = state.db.get()?;
    lifecycle::delete_moment(&mut conn, &user, &moment_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_moment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
) -> AppResult<Json<CounterResponse>> {
    let mut conn = state.db.get()?;
    Ok(Json(interactions::like_moment(&mut conn, &user, &moment_id)?))
}

async fn unlike_moment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
) -> AppResult<Json<CounterResponse>> {
    let mut conn = state.db.get()?;
    Ok(Json(interactions::unlike_moment(&mut conn, &user, &moment_id)?))
}

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> AppResult<Json<CounterResponse>> {
    let mut conn = state.db.get()?;
    let response = interactions::add_comment(
        &mut conn,
        state.config.moments(),
        &user,
        &moment_id,
        &req.comment,
    )?;
    Ok(Json(response))
}

async fn share_moment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
) -> AppResult<Json<CounterResponse>> {
    let mut conn = state.db.get()?;
    Ok(Json(interactions::share_moment(&mut conn, &user, &moment_id)?))
}

async fn moment_activity(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(moment_id): Path<String>,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    let conn = state.db.get()?;
    feed::load_visible(&conn, &user.id, &moment_id)?;
    Ok(Json(activity::moment_activity(&conn, &moment_id)?))
}

async fn trending_hashtags(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<TrendingQuery>,
) -> AppResult<Json<Vec<Hashtag>>> {
    let conn = state.db.get()?;
    let limit = state.config.moments().feed_limit(query.limit);
    Ok(Json(hashtags::trending(&conn, limit)?))
}
