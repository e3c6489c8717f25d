use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::session;
use crate::error::AppResult;
use crate::extractors::{extract_session_token, CurrentUser};
use crate::moments::{activity, notifications};
use crate::state::AppState;
use crate::users;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub display_name: Option<String>,
    pub department: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/me", get(me))
        .route(
            "/api/users/{username}/follow",
            post(follow).delete(unfollow),
        )
        .route("/api/session/logout", post(logout))
}

/// Register an account and sign it in.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    let user = {
        let conn = state.db.get()?;
        users::create_user(
            &conn,
            &req.username,
            req.display_name.as_deref(),
            req.department.as_deref(),
        )?
    };

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&state.db, &user.id, hours)?;
    let cookie = session::session_cookie(&state.config.auth.cookie_name, &token, hours);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(user),
    )
        .into_response())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = extract_session_token(&headers, cookie_name) {
        session::delete_session(&state.db, token)?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session::clear_cookie(cookie_name))],
    )
        .into_response())
}

async fn me(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let profile = users::get_user(&conn, &user.id)?;
    let activity = activity::get_user_activity(&conn, &user.id)?;
    let unread = notifications::unread_count(&conn, &user.id)?;

    Ok(Json(json!({
        "user": profile,
        "activity": activity,
        "unread_notifications": unread,
    })))
}

async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    users::follow(&conn, &user.id, &username)?;
    Ok(Json(json!({ "status": "success" })))
}

async fn unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    users::unfollow(&conn, &user.id, &username)?;
    Ok(Json(json!({ "status": "success" })))
}
