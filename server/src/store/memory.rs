use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, TodoStore};
use crate::model::{self, Todo, TodoFields};

/// In-process store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<u64, Todo>,
    last_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, fields: TodoFields) -> StoreResult<Todo> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let todo = Todo::new(table.last_id, fields, model::now());
        table.rows.insert(todo.id, todo.clone());
        tracing::debug!(id = todo.id, "todo created");
        Ok(todo)
    }

    async fn get(&self, id: u64) -> StoreResult<Option<Todo>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Todo>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn update(&self, id: u64, fields: TodoFields) -> StoreResult<Todo> {
        let mut table = self.table.write().await;
        let todo = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        todo.apply(fields, model::now());
        tracing::debug!(id, "todo updated");
        Ok(todo.clone())
    }

    async fn delete(&self, id: u64) -> StoreResult<()> {
        let mut table = self.table.write().await;
        if table.rows.remove(&id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::debug!(id, "todo deleted");
        Ok(())
    }
}
