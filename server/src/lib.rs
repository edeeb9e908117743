//! HTTP service for todo items.
//!
//! # Overview
//! Seven routes under `/api/todo`: create, update, get one, list, delete, and
//! two upload stubs that accept any body and always report success.
//!
//! # Design
//! - Storage sits behind the `TodoStore` trait and is handed to the router
//!   through `AppState`; there is no global state.
//! - A lookup miss on `get` is an empty result; on `update`/`delete` it is
//!   `StoreError::NotFound`. Both end up as 404 with a `msg` body, but with
//!   different messages.
//! - Security schemes are not enforced on any route.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod routes;
pub mod store;

use std::future::Future;

use tokio::net::TcpListener;

pub use config::Config;
pub use error::AppError;
pub use handlers::AppState;
pub use model::{Todo, TodoFields};
pub use routes::app;
pub use store::{MemoryStore, SqliteStore, StoreError, TodoStore};

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    run_until(listener, state, std::future::pending()).await
}

/// Serve until `shutdown` resolves, letting in-flight requests finish.
pub async fn run_until<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
