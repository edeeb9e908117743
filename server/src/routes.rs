use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

/// Build the router for the todo API on top of the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/todo/store", post(handlers::store_todo))
        .route("/api/todo/update/{id}", put(handlers::update_todo))
        .route("/api/todo/get/{id}", get(handlers::get_todo))
        .route("/api/todo/gets", get(handlers::list_todos))
        .route("/api/todo/delete/{id}", delete(handlers::delete_todo))
        .route("/api/todo/upload", post(handlers::upload))
        .route("/api/todo/avatar", post(handlers::avatar))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
