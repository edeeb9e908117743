//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` carries the server's `msg` text: the API answers a missing
//! record with different messages depending on the endpoint, and callers
//! may want to show it. Every other non-200 answer lands in `HttpError`.

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404. Holds the `msg` field of the body, or an
    /// empty string when the body had none.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server returned a status other than 200 and 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
