use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::moments::model::Notification;
use crate::moments::notifications;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list))
        .route("/api/notifications/read-all", post(read_all))
        .route("/api/notifications/{id}/read", post(read_one))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let conn = state.db.get()?;
    // Same page bounds as the feed
    let limit = state.config.moments().feed_limit(query.limit);
    Ok(Json(notifications::list_notifications(
        &conn,
        &user.id,
        query.unread_only,
        limit,
    )?))
}

async fn read_one(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    notifications::mark_read(&conn, &user.id, &id)?;
    Ok(Json(json!({ "status": "success" })))
}

async fn read_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let updated = notifications::mark_all_read(&conn, &user.id)?;
    Ok(Json(json!({ "status": "success", "updated": updated })))
}
