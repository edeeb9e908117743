//! SQLite-backed todo store.
//!
//! A single connection behind a mutex; every call runs on the blocking pool
//! so the async handlers never wait on disk I/O directly.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use super::{StoreError, StoreResult, TodoStore};
use crate::model::{self, timestamp, Todo, TodoFields};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NULL,
    content TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

const TODO_SELECT_SQL: &str = "SELECT id, title, content, created_at, updated_at FROM todos";

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Backend(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "sqlite todo store opened");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("sqlite connection mutex poisoned".to_string()))?;
            op(&mut guard)
        })
        .await
        .map_err(|err| StoreError::Backend(format!("sqlite task failed: {err}")))?
    }
}

#[async_trait]
impl TodoStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn create(&self, fields: TodoFields) -> StoreResult<Todo> {
        self.with_conn(move |conn| {
            let now = model::now();
            let stamp = timestamp::format(&now);
            let title = fields.title.clone().flatten();
            let content = fields.content.clone().flatten();
            conn.execute(
                "INSERT INTO todos (title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![title, content, stamp, stamp],
            )?;
            let id = row_id(conn.last_insert_rowid())?;
            tracing::debug!(id, "todo created");
            Ok(Todo::new(id, fields, now))
        })
        .await
    }

    async fn get(&self, id: u64) -> StoreResult<Option<Todo>> {
        let Ok(key) = i64::try_from(id) else {
            return Ok(None);
        };
        self.with_conn(move |conn| select_one(conn, key)).await
    }

    async fn list(&self) -> StoreResult<Vec<Todo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{TODO_SELECT_SQL} ORDER BY id"))?;
            let rows = stmt.query_map([], map_todo)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
        })
        .await
    }

    async fn update(&self, id: u64, fields: TodoFields) -> StoreResult<Todo> {
        let Ok(key) = i64::try_from(id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut todo =
                select_one(&tx, key)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            todo.apply(fields, model::now());
            tx.execute(
                "UPDATE todos SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    todo.title,
                    todo.content,
                    timestamp::format(&todo.updated_at),
                    key
                ],
            )?;
            tx.commit()?;
            tracing::debug!(id, "todo updated");
            Ok(todo)
        })
        .await
    }

    async fn delete(&self, id: u64) -> StoreResult<()> {
        let Ok(key) = i64::try_from(id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        self.with_conn(move |conn| {
            let affected = conn.execute("DELETE FROM todos WHERE id = ?1", params![key])?;
            if affected == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            tracing::debug!(id, "todo deleted");
            Ok(())
        })
        .await
    }
}

fn select_one(conn: &Connection, key: i64) -> StoreResult<Option<Todo>> {
    conn.query_row(
        &format!("{TODO_SELECT_SQL} WHERE id = ?1"),
        params![key],
        map_todo,
    )
    .optional()
    .map_err(StoreError::from)
}

fn map_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let id: i64 = row.get(0)?;
    Ok(Todo {
        id: u64::try_from(id).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err))
        })?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_stamp(row, 3)?,
        updated_at: parse_stamp(row, 4)?,
    })
}

fn parse_stamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn row_id(raw: i64) -> StoreResult<u64> {
    u64::try_from(raw).map_err(|_| StoreError::Backend(format!("negative rowid {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn crud_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store.create(TodoFields::new("t", "c")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let fields: TodoFields = serde_json::from_str(r#"{"content":null}"#).unwrap();
        let updated = store.update(created.id, fields).await.unwrap();
        assert_eq!(updated.title.as_deref(), Some("t"));
        assert_eq!(updated.content, None);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(store.get(created.id).await.unwrap().unwrap(), updated);

        store.delete(created.id).await.unwrap();
        assert!(store.get(created.id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn misses_follow_the_store_contract() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get(5).await.unwrap().is_none());
        assert!(store.get(u64::MAX).await.unwrap().is_none());
        assert!(matches!(
            store.update(5, TodoFields::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(5).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn autoincrement_ids_are_not_reused() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.create(TodoFields::default()).await.unwrap();
        let second = store.create(TodoFields::default()).await.unwrap();
        store.delete(second.id).await.unwrap();
        let third = store.create(TodoFields::default()).await.unwrap();
        assert_eq!((first.id, second.id, third.id), (1, 2, 3));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.db");

        let created = {
            let store = SqliteStore::open(&path).unwrap();
            store.create(TodoFields::new("kept", "on disk")).await.unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        let todos = store.list().await.unwrap();
        assert_eq!(todos, vec![created]);
    }
}
