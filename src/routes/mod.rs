pub mod graphql;
pub mod moments;
pub mod notifications;
pub mod users;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full HTTP surface with request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(users::router())
        .merge(moments::router())
        .merge(notifications::router())
        .merge(graphql::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
