//! Per-request execution context.
//!
//! A [`Context`] pairs the transport handle of one request with pooled
//! request state. Handlers drive the chain through an explicit
//! cursor: [`Context::next`] runs the pending handlers in order and
//! [`Context::abort`] moves the cursor past the end so nothing else runs.
//!
//! ```text
//!   idle ──acquire──▶ dispatching ──abort/error──▶ aborted
//!    ▲                    │                           │
//!    └──────release───────┴───────────release─────────┘
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use parking_lot::RwLock;
use trellis_router::Params;

use crate::engine::Engine;
use crate::error::Error;
use crate::exchange::Exchange;
use crate::handler::HandlersChain;

/// Cursor value meaning "no further handlers run".
///
/// Handler chains are limited to fewer entries than this.
pub const ABORT_INDEX: i8 = i8::MAX / 2;

/// Content type used by the plain-text writers.
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

type Keys = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// Request state recycled through the engine's pool.
pub(crate) struct Slot {
    pub(crate) params: Params,
    keys: RwLock<Option<Keys>>,
    pub(crate) method: Option<Method>,
    pub(crate) route_path: Option<Arc<str>>,
    pub(crate) handlers: Option<HandlersChain>,
    index: i8,
    error: Option<Error>,
    pub(crate) tsr: bool,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            params: Params::with_capacity(4),
            keys: RwLock::new(None),
            method: None,
            route_path: None,
            handlers: None,
            index: -1,
            error: None,
            tsr: false,
        }
    }

    /// Clears all request state; `params` keeps its capacity.
    pub(crate) fn reset(&mut self) {
        self.params.clear();
        *self.keys.get_mut() = None;
        self.method = None;
        self.route_path = None;
        self.handlers = None;
        self.index = -1;
        self.error = None;
        self.tsr = false;
    }

    #[cfg(test)]
    pub(crate) fn has_keys(&self) -> bool {
        self.keys.read().is_some()
    }
}

/// The state of one request while its handler chain runs.
///
/// `&Context` is `Sync`, so helper threads spawned with
/// [`std::thread::scope`] can read parameters and use the scratchpad.
pub struct Context<'a> {
    exchange: &'a mut dyn Exchange,
    engine: &'a Engine,
    slot: &'a mut Slot,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("path", &self.exchange.path())
            .field("route_path", &self.route_path())
            .field("params", &self.slot.params)
            .field("index", &self.slot.index)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    pub(crate) fn new(exchange: &'a mut dyn Exchange, engine: &'a Engine, slot: &'a mut Slot) -> Self {
        Self {
            exchange,
            engine,
            slot,
        }
    }

    /// Records the route that matched.
    pub(crate) fn stamp(&mut self, method: Method, route_path: Arc<str>) {
        self.slot.method = Some(method);
        self.slot.route_path = Some(route_path);
    }

    // Flow control

    /// Runs the pending handlers of the chain.
    ///
    /// Middleware calls this to run everything after it before continuing
    /// with its own work. A handler returning `Err` is reported through
    /// [`Context::report`], which aborts the chain.
    pub fn next(&mut self) {
        let Some(chain) = self.slot.handlers.clone() else {
            return;
        };

        self.slot.index = self.slot.index.saturating_add(1);
        while let Some(handler) = usize::try_from(self.slot.index)
            .ok()
            .and_then(|i| chain.get(i))
        {
            if let Err(err) = handler(self) {
                self.report(err);
            }
            self.slot.index = self.slot.index.saturating_add(1);
        }
    }

    /// Prevents pending handlers from running.
    ///
    /// The calling handler itself keeps running until it returns.
    pub fn abort(&mut self) {
        self.slot.index = ABORT_INDEX;
    }

    /// Returns true once the chain has been aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.slot.index >= ABORT_INDEX
    }

    /// Writes `code` as the response status and aborts.
    pub fn abort_with_status(&mut self, code: StatusCode) {
        self.status(code);
        self.abort();
    }

    /// Reports `err` and aborts.
    pub fn abort_with_error(&mut self, err: impl Into<Error>) {
        self.report(err.into());
    }

    /// Routes `err` to the engine's error handler, or to the default one,
    /// then aborts the chain.
    ///
    /// The default handler writes the error's status code (500 when it has
    /// none) and its message as plain text.
    pub fn report(&mut self, err: Error) {
        tracing::debug!(
            method = %self.method(),
            path = self.exchange.path(),
            error = %err,
            "handler reported an error"
        );

        match self.engine.error_handler().cloned() {
            Some(error_handler) => error_handler(self, &err),
            None => default_error_handler(self, &err),
        }
        self.slot.error = Some(err);
        self.abort();
    }

    // Request data

    /// Returns the method the route was registered under, or the request
    /// method when no route matched.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.slot
            .method
            .as_ref()
            .unwrap_or_else(|| self.exchange.method())
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.exchange.path()
    }

    /// Returns the pattern of the matched route.
    #[must_use]
    pub fn route_path(&self) -> Option<&str> {
        self.slot.route_path.as_deref()
    }

    /// Returns the path parameters bound by the route match.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.slot.params
    }

    /// Returns the value of the path parameter `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.slot.params.get(name)
    }

    /// Returns the first value of the query parameter `key`.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<String> {
        self.exchange.query(key)
    }

    /// Returns the query parameter `key`, or `default` when it is absent.
    ///
    /// A present but empty value is returned as the empty string.
    #[must_use]
    pub fn default_query(&self, key: &str, default: &str) -> String {
        self.query(key).unwrap_or_else(|| default.to_string())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.exchange.body()
    }

    /// Returns a request header value.
    #[must_use]
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.exchange.request_header(name)
    }

    /// Returns the last error reported on this request.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.slot.error.as_ref()
    }

    /// Returns true when no route matched but toggling the trailing slash of
    /// the path would have.
    #[must_use]
    pub fn trailing_slash_redirect(&self) -> bool {
        self.slot.tsr
    }

    /// Returns the engine serving this request.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        self.engine
    }

    /// Returns the transport handle.
    #[must_use]
    pub fn exchange(&self) -> &dyn Exchange {
        &*self.exchange
    }

    /// Returns the transport handle mutably.
    pub fn exchange_mut(&mut self) -> &mut dyn Exchange {
        &mut *self.exchange
    }

    // Response writers

    /// Sets the response status.
    pub fn status(&mut self, code: StatusCode) {
        self.exchange.set_status(code);
    }

    /// Returns the response status written so far.
    #[must_use]
    pub fn response_status(&self) -> StatusCode {
        self.exchange.status()
    }

    /// Sets a response header.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) {
        self.exchange.set_header(name, value);
    }

    /// Writes a status, a content type and a body.
    pub fn bytes(&mut self, code: StatusCode, content_type: &'static str, data: impl Into<Bytes>) {
        self.exchange
            .set_header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.exchange.set_body(data.into());
        self.exchange.set_status(code);
    }

    /// Writes a status and a plain-text body.
    pub fn string(&mut self, code: StatusCode, text: impl Into<String>) {
        self.bytes(code, TEXT_PLAIN_UTF8, Bytes::from(text.into()));
    }

    // Scratchpad

    /// Stores `value` under `key` for the rest of this request.
    pub fn set<V>(&self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.slot
            .keys
            .write()
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Arc::new(value));
    }

    /// Returns a clone of the value stored under `key` if it has type `V`.
    #[must_use]
    pub fn get<V>(&self, key: &str) -> Option<V>
    where
        V: Any + Clone,
    {
        self.slot
            .keys
            .read()
            .as_ref()
            .and_then(|keys| keys.get(key))
            .and_then(|value| value.downcast_ref::<V>())
            .cloned()
    }

    /// Returns the value stored under `key` without a type check.
    #[must_use]
    pub fn get_any(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.slot
            .keys
            .read()
            .as_ref()
            .and_then(|keys| keys.get(key))
            .cloned()
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.slot
            .keys
            .read()
            .as_ref()
            .is_some_and(|keys| keys.contains_key(key))
    }

    /// Returns the value stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics when the key is missing or holds another type.
    #[must_use]
    pub fn must_get<V>(&self, key: &str) -> V
    where
        V: Any + Clone,
    {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key \"{key}\" does not exist"),
        }
    }
}

fn default_error_handler(ctx: &mut Context<'_>, err: &Error) {
    let code = err.status_code().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    ctx.string(code, err.to_string());
}
