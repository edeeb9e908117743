//! The todo record and the field payload accepted by create and update.
//!
//! # Design
//! `TodoFields` distinguishes a key that is absent from a key that is present
//! with `null`: absent keys leave the stored value alone, `null` clears it.
//! Unknown keys are ignored so clients can send the whole record back.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single todo item as stored and as returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Build a fresh record; both timestamps start at `now`.
    pub fn new(id: u64, fields: TodoFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title.flatten(),
            content: fields.content.flatten(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the present fields and refresh `updated_at`.
    ///
    /// `updated_at` never moves backwards, even if the wall clock does.
    pub fn apply(&mut self, fields: TodoFields, now: DateTime<Utc>) {
        if let Some(title) = fields.title {
            self.title = title;
        }
        if let Some(content) = fields.content {
            self.content = content;
        }
        self.updated_at = self.updated_at.max(now);
    }
}

/// Request payload for both create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TodoFields {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,
}

impl TodoFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(Some(title.into())),
            content: Some(Some(content.into())),
        }
    }
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Current time at the precision the wire format carries.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `2021-12-11T09:25:53.000000Z` style timestamps.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    pub fn format(at: &DateTime<Utc>) -> String {
        at.format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&at.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 12, 11, 9, 25, 53).unwrap()
    }

    #[test]
    fn todo_serializes_to_json() {
        let todo = Todo::new(1, TodoFields::new("title", "content"), fixed());
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "title");
        assert_eq!(json["content"], "content");
        assert_eq!(json["created_at"], "2021-12-11T09:25:53.000000Z");
        assert_eq!(json["updated_at"], "2021-12-11T09:25:53.000000Z");
    }

    #[test]
    fn missing_fields_serialize_as_null() {
        let todo = Todo::new(7, TodoFields::default(), fixed());
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json["title"].is_null());
        assert!(json["content"].is_null());
    }

    #[test]
    fn timestamp_keeps_microseconds() {
        let at = fixed() + Duration::microseconds(26_490);
        assert_eq!(timestamp::format(&at), "2021-12-11T09:25:53.026490Z");
        assert_eq!(timestamp::parse("2021-12-11T09:25:53.026490Z").unwrap(), at);
    }

    #[test]
    fn fields_ignore_unknown_keys() {
        let fields: TodoFields =
            serde_json::from_str(r#"{"title":"t","priority":3,"id":99}"#).unwrap();
        assert_eq!(fields.title, Some(Some("t".to_string())));
        assert_eq!(fields.content, None);
    }

    #[test]
    fn fields_distinguish_null_from_absent() {
        let fields: TodoFields = serde_json::from_str(r#"{"title":null}"#).unwrap();
        assert_eq!(fields.title, Some(None));
        assert_eq!(fields.content, None);
    }

    #[test]
    fn fields_reject_non_string_title() {
        let result: Result<TodoFields, _> = serde_json::from_str(r#"{"title":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn apply_changes_only_present_fields() {
        let mut todo = Todo::new(1, TodoFields::new("t", "c"), fixed());
        let later = fixed() + Duration::seconds(5);
        todo.apply(
            serde_json::from_str(r#"{"content":"new"}"#).unwrap(),
            later,
        );
        assert_eq!(todo.title.as_deref(), Some("t"));
        assert_eq!(todo.content.as_deref(), Some("new"));
        assert_eq!(todo.created_at, fixed());
        assert_eq!(todo.updated_at, later);
    }

    #[test]
    fn apply_never_moves_updated_at_backwards() {
        let mut todo = Todo::new(1, TodoFields::default(), fixed());
        todo.apply(TodoFields::default(), fixed() - Duration::hours(1));
        assert_eq!(todo.updated_at, fixed());
        assert!(todo.created_at <= todo.updated_at);
    }
}
