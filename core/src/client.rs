//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Every endpoint answers 200 on success.

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AvatarForm, Message, Rows, Success, Todo, TodoFields};

const API_PREFIX: &str = "/api/todo";

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{API_PREFIX}/{route}", self.base_url)
    }

    pub fn build_store_todo(&self, input: &TodoFields) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, self.url("store"), input)
    }

    pub fn build_update_todo(&self, id: u64, input: &TodoFields) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Put, self.url(&format!("update/{id}")), input)
    }

    pub fn build_get_todo(&self, id: u64) -> HttpRequest {
        bare_request(HttpMethod::Get, self.url(&format!("get/{id}")))
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        bare_request(HttpMethod::Get, self.url("gets"))
    }

    pub fn build_delete_todo(&self, id: u64) -> HttpRequest {
        bare_request(HttpMethod::Delete, self.url(&format!("delete/{id}")))
    }

    /// Raw file upload; the bytes are sent as `application/octet-stream`.
    pub fn build_upload(&self, bytes: &[u8]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: self.url("upload"),
            headers: vec![(
                "content-type".to_string(),
                "application/octet-stream".to_string(),
            )],
            body: Some(bytes.to_vec()),
        }
    }

    /// Multipart avatar form with a random boundary.
    pub fn build_avatar(&self, form: &AvatarForm) -> HttpRequest {
        let boundary = format!("todo-{}", Uuid::new_v4().simple());
        self.build_avatar_with_boundary(form, &boundary)
    }

    pub fn build_avatar_with_boundary(&self, form: &AvatarForm, boundary: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: self.url("avatar"),
            headers: vec![(
                "content-type".to_string(),
                format!("multipart/form-data; boundary={boundary}"),
            )],
            body: Some(multipart_body(form, boundary)),
        }
    }

    pub fn parse_store_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_ok(response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_ok(response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_ok(response)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_ok::<Rows>(response).map(|rows| rows.rows)
    }

    /// Returns the confirmation message.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<String, ApiError> {
        parse_ok::<Message>(response).map(|message| message.msg)
    }

    pub fn parse_upload(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_success(response)
    }

    pub fn parse_avatar(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_success(response)
    }
}

fn bare_request(method: HttpMethod, path: String) -> HttpRequest {
    HttpRequest {
        method,
        path,
        headers: Vec::new(),
        body: None,
    }
}

fn json_request(method: HttpMethod, path: String, input: &TodoFields) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_vec(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
    Ok(HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

fn multipart_body(form: &AvatarForm, boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(form.bytes.len() + 256);
    if let Some(name) = &form.name {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            form.file_name, form.content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&form.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn parse_ok<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn parse_success(response: HttpResponse) -> Result<(), ApiError> {
    let status = response.status;
    let body = response.body.clone();
    let success: Success = parse_ok(response)?;
    if success.success {
        Ok(())
    } else {
        Err(ApiError::HttpError { status, body })
    }
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        404 => {
            let msg = serde_json::from_str::<Message>(&response.body)
                .map(|message| message.msg)
                .unwrap_or_default();
            Err(ApiError::NotFound(msg))
        }
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
