use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{AppError, Result};
use crate::shared::types::UploadFile;

/// HTTP verbs used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Non-idempotent methods carry the anti-forgery header
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A single multipart form field
#[derive(Debug, Clone)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, file: UploadFile },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file: UploadFile) -> Self {
        FormField::File {
            name: name.into(),
            file,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<FormField>),
}

/// Transport-agnostic description of a call against the image host
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the configured base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = Some(RequestBody::Multipart(fields));
        self
    }

    /// Value of a query parameter, if present
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A response that made it back from the server, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when the body was empty or not JSON
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` field of a structured error payload
    pub fn error_message(&self) -> Option<String> {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    pub fn error_message_or(&self, fallback: &str) -> String {
        self.error_message()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Decode a 2xx body, or map the error status onto `AppError`
    pub fn into_result<T: DeserializeOwned>(self, fallback: &str) -> Result<T> {
        if self.is_success() {
            return self.json();
        }

        let message = self.error_message_or(fallback);
        Err(match self.status {
            401 | 403 => AppError::Unauthorized(message),
            404 => AppError::NotFound(message),
            status => AppError::Api { status, message },
        })
    }
}

/// Bytes of the request body handed to the transport so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub sent: u64,
    pub total: u64,
}

impl TransferProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.sent >= self.total
    }
}

/// Receives upload progress while the body is being streamed
pub type ProgressSink = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// No response was received
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to read response body: {0}")]
    Body(String),
}

#[async_trait]
pub trait RequestClient: Send + Sync {
    /// Perform one HTTP call.
    ///
    /// Non-2xx responses are `Ok`; only a missing response is an `Err`.
    async fn send(
        &self,
        request: ApiRequest,
        progress: Option<ProgressSink>,
    ) -> std::result::Result<ApiResponse, TransportError>;
}
