//! Request handlers for the `/api/todo` routes.
//!
//! Handlers are thin: pull the id and body out of the request, call the
//! store, shape the JSON. Path ids arrive as raw strings; one that is not a
//! valid numeric id simply never resolves to a record.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Path, Request, State},
    http::{header, HeaderMap},
    Json,
};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::model::{Todo, TodoFields};
use crate::store::{MemoryStore, SharedStore, StoreError};

pub const TODO_NOT_FOUND: &str = "Todo item not found";
pub const DELETE_SUCCESS: &str = "delete todo success";

/// Router state; the store handle is supplied by whoever builds the router.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

/// `{"msg": "..."}` body used for confirmations and errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub msg: String,
}

impl Message {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TodoRows {
    pub rows: Vec<Todo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

/// JSON body extractor for create/update.
///
/// An empty body counts as `{}`. The content type is not checked. Bodies that
/// fail to parse, or parse to anything other than a JSON object, surface as
/// `AppError::MalformedBody`.
pub struct TodoPayload(pub TodoFields);

impl<S> FromRequest<S> for TodoPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::warn!(
                    status = %rejection.status(),
                    error = %rejection.body_text(),
                    "request body rejected"
                );
                AppError::MalformedBody(rejection.body_text())
            })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(TodoFields::default()));
        }
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|err| AppError::MalformedBody(err.to_string()))?;
        if !value.is_object() {
            return Err(AppError::MalformedBody("expected a JSON object".to_string()));
        }
        serde_json::from_value(value)
            .map(Self)
            .map_err(|err| AppError::MalformedBody(err.to_string()))
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

/// Not-found messages echo the path segment as sent, so `007` stays `007`.
fn with_raw_id(err: StoreError, raw: &str) -> StoreError {
    match err {
        StoreError::NotFound(_) => StoreError::NotFound(raw.to_string()),
        other => other,
    }
}

pub async fn store_todo(
    State(state): State<AppState>,
    TodoPayload(fields): TodoPayload,
) -> Result<Json<Todo>> {
    let todo = state.store.create(fields).await?;
    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    TodoPayload(fields): TodoPayload,
) -> Result<Json<Todo>> {
    let key = parse_id(&id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    let todo = state
        .store
        .update(key, fields)
        .await
        .map_err(|err| with_raw_id(err, &id))?;
    Ok(Json(todo))
}

pub async fn get_todo(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Todo>> {
    let found = match parse_id(&id) {
        Some(key) => state.store.get(key).await?,
        None => None,
    };
    found
        .map(Json)
        .ok_or_else(|| AppError::NotFound(TODO_NOT_FOUND.to_string()))
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<TodoRows>> {
    let rows = state.store.list().await?;
    Ok(Json(TodoRows { rows }))
}

pub async fn delete_todo(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Message>> {
    let key = parse_id(&id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    state
        .store
        .delete(key)
        .await
        .map_err(|err| with_raw_id(err, &id))?;
    Ok(Json(Message::new(DELETE_SUCCESS)))
}

/// Accepts any binary body and discards it.
pub async fn upload(headers: HeaderMap, body: Body) -> Json<Success> {
    discard_body("upload", &headers, body).await;
    Json(Success { success: true })
}

/// Accepts any multipart form and discards it.
pub async fn avatar(headers: HeaderMap, body: Body) -> Json<Success> {
    discard_body("avatar", &headers, body).await;
    Json(Success { success: true })
}

/// Read the body to the end without buffering it, so the client never sees
/// the connection closed under a large upload. A body error ends the read
/// but not the request.
async fn discard_body(endpoint: &'static str, headers: &HeaderMap, mut body: Body) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    let mut received = 0usize;
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Some(data) = frame.data_ref() {
                    received += data.len();
                }
            }
            Err(err) => {
                tracing::debug!(endpoint, error = %err, "upload body read failed");
                break;
            }
        }
    }
    tracing::debug!(endpoint, content_type, received, "upload body discarded");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_only_numbers() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn not_found_keeps_the_raw_path_segment() {
        let err = with_raw_id(StoreError::NotFound("7".to_string()), "007");
        assert_eq!(err.to_string(), "No query results for model [App\\Models\\Todo] 007");

        let err = with_raw_id(StoreError::Backend("locked".to_string()), "007");
        assert!(matches!(err, StoreError::Backend(ref msg) if msg == "locked"));
    }

    #[test]
    fn message_serializes_as_msg() {
        let json = serde_json::to_value(Message::new(DELETE_SUCCESS)).unwrap();
        assert_eq!(json, serde_json::json!({ "msg": "delete todo success" }));
    }

    #[test]
    fn success_serializes_as_flag() {
        let json = serde_json::to_value(Success { success: true }).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));
    }
}
