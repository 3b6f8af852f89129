//! Request and response types exchanged between the host, middleware and handlers.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

use crate::ids::RequestId;
use crate::router::ParamVec;
use crate::security::{Claims, Identity};

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` because they repeat across requests
/// (Content-Type, Authorization, ...) and `Arc::clone()` is an atomic increment.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A request as handed over by the host transport.
///
/// The transport has already parsed the wire format; the dispatcher only needs the method
/// string, the raw URI (path plus optional query string), headers and an optional JSON body.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// Request method as received (`get` and `GET` are equivalent)
    pub method: String,
    /// Raw request URI, e.g. `/users/42/like?ref=feed`
    pub uri: String,
    /// Request headers
    pub headers: HeaderVec,
    /// Parsed JSON body, if any
    pub body: Option<Value>,
}

impl IncomingRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Shorthand for `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Per-request context passed through the middleware chain to the handler.
///
/// Built fresh for every dispatched request and dropped when the response is returned.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Normalized request path (no query string, no trailing slash)
    pub path: String,
    /// Label of the handler that will serve this request
    pub handler_name: String,
    /// Path parameters in pattern order
    pub path_params: ParamVec,
    /// Query string parameters in the order received
    pub query_params: ParamVec,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Authenticated principal, set by [`crate::middleware::AuthMiddleware`]
    pub identity: Option<Identity>,
    /// Verified token claims, set by the authentication and role middleware
    pub jwt_claims: Option<Claims>,
}

impl HandlerRequest {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a pattern repeats a placeholder name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics for `?limit=10&limit=20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look a parameter up in the merged set: path parameters take precedence over
    /// same-named query parameters.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.get_path_param(name)
            .or_else(|| self.get_query_param(name))
    }

    /// Path parameter values in pattern order.
    pub fn positional_params(&self) -> impl Iterator<Item = &str> {
        self.path_params.iter().map(|(_, v)| v.as_str())
    }

    /// Merged parameter map (allocates). Path parameters win over query parameters.
    #[must_use]
    pub fn merged_params(&self) -> HashMap<String, String> {
        let mut merged: HashMap<String, String> = self
            .query_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        for (k, v) in &self.path_params {
            merged.insert(k.to_string(), v.clone());
        }
        merged
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by a middleware or handler.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200, HeaderVec::new(), Value::Null)
    }
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// `{"status":"success","data":...}` with status 200.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self::success_with_status(200, data)
    }

    /// `{"status":"success","data":...}` with a custom status (e.g. 201).
    #[must_use]
    pub fn success_with_status(status: u16, data: Value) -> Self {
        Self::json(
            status,
            serde_json::json!({ "status": "success", "data": data }),
        )
    }

    /// Body-less response, e.g. a 204 preflight answer.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Copy headers from `prelude` that this response does not already carry.
    ///
    /// Used to keep headers written by middleware that continued the chain.
    pub fn inherit_headers(&mut self, prelude: &HeaderVec) {
        for (name, value) in prelude {
            if self.get_header(name).is_none() {
                self.headers.push((Arc::clone(name), value.clone()));
            }
        }
    }
}
