//! HTTP port used for both the source-hosting API and the generation API.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Boxed future type alias used by [`HttpClient`] to keep the trait dyn-compatible.
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// HTTP verbs used by the orchestration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET` request.
    Get,
    /// `POST` request.
    Post,
}

/// An outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Builds a `GET` request for `url`.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: HttpMethod::Get, url: url.into(), headers: BTreeMap::new(), body: None }
    }

    /// Builds a `POST` request for `url` carrying a JSON body.
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: BTreeMap::new(),
            body: Some(body),
        }
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A received HTTP response. Any status code counts as a received response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Response headers with lower-cased names.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Raw response body.
    #[serde(default)]
    pub body: String,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers.get(&name).map(String::as_str)
    }
}

/// Transport-level failure: the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    /// Human-readable failure description.
    pub message: String,
}

impl HttpError {
    /// Creates a transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<String> for HttpError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Sends HTTP requests.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received (DNS, connect,
    /// timeout, body read failure).
    fn send(&self, request: &HttpRequest) -> HttpFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("retry-after".to_string(), "5".to_string());
        let response = HttpResponse { status: 429, headers, body: String::new() };

        assert_eq!(response.header("Retry-After"), Some("5"));
        assert!(!response.is_success());
    }

    #[test]
    fn request_serializes_method_uppercase() {
        let request = HttpRequest::get("https://example.com").header("accept", "text/plain");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["method"], "GET");
        assert_eq!(value["headers"]["accept"], "text/plain");
        assert!(value.get("body").is_none());
    }
}
