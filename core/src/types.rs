//! Wire DTOs for the todo API.
//!
//! # Design
//! Defined independently of the server crate; the integration tests catch
//! schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for both store and update.
///
/// `None` leaves a key out of the JSON entirely, `Some(None)` sends `null`
/// and clears the field on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFields {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub title: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub content: Option<Option<String>>,
}

impl TodoFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(Some(title.into())),
            content: Some(Some(content.into())),
        }
    }

    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: Some(Some(title.into())),
            content: None,
        }
    }

    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(Some(content.into())),
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Form posted to the avatar endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarForm {
    /// Optional plain `name` field.
    pub name: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Rows {
    pub rows: Vec<Todo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Success {
    pub success: bool,
}
