//! Call descriptors for upstream operations.

use std::fmt;

use serde_json::Value;

/// HTTP methods the gateway issues upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    Get,
    Put,
    Post,
}

impl UpstreamMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            UpstreamMethod::Get => "GET",
            UpstreamMethod::Put => "PUT",
            UpstreamMethod::Post => "POST",
        }
    }
}

impl From<UpstreamMethod> for reqwest::Method {
    fn from(method: UpstreamMethod) -> Self {
        match method {
            UpstreamMethod::Get => reqwest::Method::GET,
            UpstreamMethod::Put => reqwest::Method::PUT,
            UpstreamMethod::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for UpstreamMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream call: method, path relative to the API root, query string
/// and optional JSON body. Token fetches carry the absolute auth URL as
/// their path instead.
///
/// `resource` is a short label (e.g. `sensors.samples`) used in logs and
/// metrics.
///
/// # Example
///
/// ```rust,ignore
/// let request = UpstreamRequest::get("sensors.samples", format!("/sensors/{id}/samples"))
///     .with_query(query.to_query_pairs());
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub resource: &'static str,
    pub method: UpstreamMethod,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    fn new(resource: &'static str, method: UpstreamMethod, path: impl Into<String>) -> Self {
        Self {
            resource,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(resource: &'static str, path: impl Into<String>) -> Self {
        Self::new(resource, UpstreamMethod::Get, path)
    }

    pub fn put(resource: &'static str, path: impl Into<String>) -> Self {
        Self::new(resource, UpstreamMethod::Put, path)
    }

    pub fn post(resource: &'static str, path: impl Into<String>) -> Self {
        Self::new(resource, UpstreamMethod::Post, path)
    }

    /// Set the query-string pairs.
    pub fn with_query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body. The value is sent as-is, without any wrapping.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw upstream answer: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}
