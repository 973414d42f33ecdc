//! The transport handle a dispatch reads from and writes to.
//!
//! The engine never touches sockets or raw bytes. A listener adapts each
//! request into something implementing [`Exchange`] and hands it to
//! [`Engine::dispatch`](crate::Engine::dispatch). [`HttpExchange`] is the
//! in-memory adapter built on the `http` crate types.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Request, Response, StatusCode};

/// Request view and response sink for one dispatch.
pub trait Exchange: Send + Sync {
    /// Returns the request method.
    fn method(&self) -> &Method;

    /// Returns the request path, without the query string.
    fn path(&self) -> &str;

    /// Returns the first value of the query parameter `key`.
    fn query(&self, key: &str) -> Option<String>;

    /// Returns the request body.
    fn body(&self) -> &[u8];

    /// Returns the request header `name` if present and valid UTF-8.
    fn request_header(&self, name: &str) -> Option<&str> {
        let _ = name;
        None
    }

    /// Returns the response status written so far.
    fn status(&self) -> StatusCode;

    /// Sets the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Sets a response header, replacing any previous value.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Replaces the response body.
    fn set_body(&mut self, body: Bytes);
}

/// In-memory [`Exchange`] over `http` request and response types.
///
/// # Example
///
/// ```
/// use trellis_core::{Exchange, HttpExchange};
/// use http::{Method, StatusCode};
///
/// let mut exchange = HttpExchange::new(Method::GET, "/search?q=rust&q=go");
/// assert_eq!(exchange.path(), "/search");
/// assert_eq!(exchange.query("q").as_deref(), Some("rust"));
///
/// exchange.set_status(StatusCode::CREATED);
/// let response = exchange.into_response();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Clone)]
pub struct HttpExchange {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    request_headers: HeaderMap,
    body: Bytes,
    status: StatusCode,
    response_headers: HeaderMap,
    response_body: Bytes,
}

impl HttpExchange {
    /// Creates an exchange for `method` and `target` (path plus optional
    /// query string) with an empty body.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method,
            path: path.to_string(),
            query: parse_query(query),
            request_headers: HeaderMap::new(),
            body: Bytes::new(),
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: Bytes::new(),
        }
    }

    /// Creates an exchange from a buffered request.
    #[must_use]
    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parse_query(parts.uri.query().unwrap_or_default()),
            request_headers: parts.headers,
            body,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            response_body: Bytes::new(),
        }
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    /// Returns the response headers written so far.
    #[must_use]
    pub const fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Returns the response body written so far.
    #[must_use]
    pub const fn response_body(&self) -> &Bytes {
        &self.response_body
    }

    /// Converts the written status, headers and body into a response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.response_body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.response_headers;
        response
    }
}

impl Exchange for HttpExchange {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self, key: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers.get(name)?.to_str().ok()
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    fn set_body(&mut self, body: Bytes) {
        self.response_body = body;
    }
}

/// Malformed query strings yield no parameters.
fn parse_query(query: &str) -> Vec<(String, String)> {
    if query.is_empty() {
        return Vec::new();
    }
    serde_urlencoded::from_str(query).unwrap_or_default()
}
