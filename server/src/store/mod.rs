//! Persistence for todo records.
//!
//! # Design
//! `get` reports a miss as `Ok(None)`, while `update` and `delete` report it
//! as `StoreError::NotFound`. Handlers rely on that asymmetry: the former is
//! turned into a fixed message locally, the latter carries its own message.

mod memory;
mod sqlite;

use std::{path::Path, sync::Arc};

use async_trait::async_trait;

use crate::model::{Todo, TodoFields};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle threaded into the router state.
pub type SharedStore = Arc<dyn TodoStore>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record for the given id. The payload is the id as the caller
    /// supplied it.
    #[error("No query results for model [App\\Models\\Todo] {0}")]
    NotFound(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn create(&self, fields: TodoFields) -> StoreResult<Todo>;

    /// Never returns `StoreError::NotFound`.
    async fn get(&self, id: u64) -> StoreResult<Option<Todo>>;

    /// All records, ascending by id.
    async fn list(&self) -> StoreResult<Vec<Todo>>;

    async fn update(&self, id: u64, fields: TodoFields) -> StoreResult<Todo>;

    async fn delete(&self, id: u64) -> StoreResult<()>;
}

/// Open the SQLite store at `database_path`, or an in-memory map when unset.
pub fn open_store(database_path: Option<&Path>) -> StoreResult<SharedStore> {
    match database_path {
        Some(path) => Ok(Arc::new(SqliteStore::open(path)?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}
