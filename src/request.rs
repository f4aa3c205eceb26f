//! Per-request context handed through the bridge

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Header browsers' AJAX helpers set on asynchronous requests
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// Value of [`REQUESTED_WITH_HEADER`] identifying an AJAX request
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Whether the headers mark an AJAX request (exact `XMLHttpRequest` match)
#[must_use]
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get(REQUESTED_WITH_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == XML_HTTP_REQUEST)
}

/// Everything the bridge needs to know about an incoming request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Module route parameter
    pub module: String,
    /// Transformer route parameter
    pub transformer: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Query string and form parameters
    pub params: HashMap<String, String>,
}

impl RequestContext {
    /// Create a context with no headers or parameters
    #[must_use]
    pub fn new(module: impl Into<String>, transformer: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            transformer: transformer.into(),
            headers: HeaderMap::new(),
            params: HashMap::new(),
        }
    }

    /// Attach request headers
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach request parameters
    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Whether the request was sent as an AJAX request
    #[must_use]
    pub fn is_ajax(&self) -> bool {
        is_ajax(&self.headers)
    }

    /// Header value as a string, if present and valid UTF-8
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}
