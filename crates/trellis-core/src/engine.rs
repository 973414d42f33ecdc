//! The dispatch engine.
//!
//! The engine owns the route trees, the global middleware, the fallback
//! chains for unmatched requests, the context pool and the configuration.
//! Routes are registered through [`Routes`] while the engine is exclusively
//! owned; afterwards it is shared (usually behind an `Arc`) and
//! [`Engine::dispatch`] is called once per request.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use parking_lot::RwLock;
use trellis_router::{join_paths, MethodTrees};

use crate::config::{EngineConfig, MethodConfig};
use crate::context::{Context, ABORT_INDEX};
use crate::error::ConfigError;
use crate::exchange::Exchange;
use crate::group::{combine_handlers, RouterGroup, Routes};
use crate::handler::{handler, ErrorHandler, HandlerFunc, HandlersChain};
use crate::pool::{ContextPool, DEFAULT_POOL_CAPACITY};

/// Body written by the default not-found handler.
pub const DEFAULT_404_BODY: &str = "404 page not found";

/// Body written by the default method-not-allowed handler.
pub const DEFAULT_405_BODY: &str = "405 method not allowed";

/// Request dispatcher and route table.
///
/// # Example
///
/// ```
/// use trellis_core::{handler, Engine, Exchange, HttpExchange, Routes};
/// use http::{Method, StatusCode};
///
/// let mut engine = Engine::default();
/// engine.get("/user/:id", [handler(|ctx| {
///     let id = ctx.param("id").unwrap_or_default().to_string();
///     ctx.string(StatusCode::OK, format!("user {id}"));
///     Ok(())
/// })]);
///
/// let mut exchange = HttpExchange::new(Method::GET, "/user/42");
/// engine.dispatch(&mut exchange);
/// assert_eq!(exchange.status(), StatusCode::OK);
/// assert_eq!(exchange.response_body().as_ref(), b"user 42");
/// ```
pub struct Engine {
    trees: MethodTrees<HandlersChain>,
    middleware: Vec<HandlerFunc>,
    no_route: Vec<HandlerFunc>,
    no_method: Vec<HandlerFunc>,
    all_no_route: HandlersChain,
    all_no_method: HandlersChain,
    config: RwLock<EngineConfig>,
    method_configs: RwLock<HashMap<String, MethodConfig>>,
    handle_method_not_allowed: bool,
    error_handler: Option<ErrorHandler>,
    logger: Option<tracing::Dispatch>,
    pool: ContextPool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &*self.config.read())
            .field("routes", &self.routes().count())
            .field("middleware", &self.middleware.len())
            .field("handle_method_not_allowed", &self.handle_method_not_allowed)
            .field("pool_capacity", &self.pool.capacity())
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_valid_config(EngineConfig::default())
    }
}

impl Engine {
    /// Creates an engine without middleware.
    ///
    /// Fails when the configuration is invalid (see
    /// [`EngineConfig::validate`]).
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_valid_config(config.validate()?))
    }

    fn with_valid_config(config: EngineConfig) -> Self {
        let mut engine = Self {
            trees: MethodTrees::new(),
            middleware: Vec::new(),
            no_route: Vec::new(),
            no_method: Vec::new(),
            all_no_route: Arc::from(Vec::new()),
            all_no_method: Arc::from(Vec::new()),
            config: RwLock::new(config),
            method_configs: RwLock::new(HashMap::new()),
            handle_method_not_allowed: true,
            error_handler: None,
            logger: None,
            pool: ContextPool::new(DEFAULT_POOL_CAPACITY),
        };
        engine.no_route([handler(|ctx| {
            ctx.string(StatusCode::NOT_FOUND, DEFAULT_404_BODY);
            ctx.abort();
            Ok(())
        })]);
        engine.no_method([handler(|ctx| {
            ctx.string(StatusCode::METHOD_NOT_ALLOWED, DEFAULT_405_BODY);
            ctx.abort();
            Ok(())
        })]);
        engine
    }

    // Configuration

    /// Replaces the configuration after validating it.
    pub fn set_config(&self, config: EngineConfig) -> Result<(), ConfigError> {
        let config = config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Sets overrides for requests on `path`.
    ///
    /// The path is matched literally against the request path.
    pub fn set_method_config(&self, path: impl Into<String>, config: MethodConfig) {
        self.method_configs.write().insert(path.into(), config);
    }

    /// Returns the overrides for `path`.
    #[must_use]
    pub fn method_config(&self, path: &str) -> Option<MethodConfig> {
        self.method_configs.read().get(path).copied()
    }

    /// Enables or disables 405 responses for paths registered under other
    /// methods. Enabled by default; when disabled such requests get the
    /// not-found chain.
    pub fn set_handle_method_not_allowed(&mut self, enabled: bool) {
        self.handle_method_not_allowed = enabled;
    }

    /// Returns whether 405 handling is enabled.
    #[must_use]
    pub fn handle_method_not_allowed(&self) -> bool {
        self.handle_method_not_allowed
    }

    /// Installs the handler that renders reported errors.
    pub fn set_error_handler(&mut self, error_handler: ErrorHandler) {
        self.error_handler = Some(error_handler);
    }

    pub(crate) fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    /// Routes all events emitted during dispatch to `dispatch` instead of
    /// the global subscriber.
    pub fn set_logger(&mut self, dispatch: tracing::Dispatch) {
        self.logger = Some(dispatch);
    }

    /// Returns the engine-scoped logger, if any.
    #[must_use]
    pub fn logger(&self) -> Option<&tracing::Dispatch> {
        self.logger.as_ref()
    }

    /// Sets how many idle contexts are kept for reuse.
    pub fn set_pool_capacity(&mut self, capacity: usize) {
        self.pool.set_capacity(capacity);
    }

    /// Returns the number of idle contexts currently pooled.
    #[must_use]
    pub fn idle_contexts(&self) -> usize {
        self.pool.idle()
    }

    // Registration

    /// Sets the handlers run when no route matches. Defaults to a plain
    /// `404 page not found`.
    pub fn no_route(&mut self, handlers: impl IntoIterator<Item = HandlerFunc>) {
        self.no_route = handlers.into_iter().collect();
        self.rebuild_404_handlers();
    }

    /// Sets the handlers run when the path matches under another method
    /// only. Defaults to a plain `405 method not allowed`.
    pub fn no_method(&mut self, handlers: impl IntoIterator<Item = HandlerFunc>) {
        self.no_method = handlers.into_iter().collect();
        self.rebuild_405_handlers();
    }

    fn rebuild_404_handlers(&mut self) {
        self.all_no_route = Arc::from(self.checked_chain(&self.no_route));
    }

    fn rebuild_405_handlers(&mut self) {
        self.all_no_method = Arc::from(self.checked_chain(&self.no_method));
    }

    fn checked_chain(&self, handlers: &[HandlerFunc]) -> Vec<HandlerFunc> {
        let chain = combine_handlers(&self.middleware, handlers.iter().cloned());
        assert_chain_len(chain.len());
        chain
    }

    /// Creates a route group below the root path.
    pub fn group(
        &mut self,
        relative_path: &str,
        middleware: impl IntoIterator<Item = HandlerFunc>,
    ) -> RouterGroup<'_> {
        let base_path = join_paths("/", relative_path);
        let handlers = combine_handlers(&self.middleware, middleware);
        RouterGroup::new(self, base_path, handlers)
    }

    pub(crate) fn add_route(&mut self, method: Method, path: &str, handlers: Vec<HandlerFunc>) {
        assert!(
            path.starts_with('/'),
            "[trellis engine]: path must begin with '/', got '{path}'"
        );
        assert!(
            !handlers.is_empty(),
            "[trellis engine]: there must be at least one handler for {method} {path}"
        );

        let stamped_method = method.clone();
        let route_path: Arc<str> = Arc::from(path);
        let prelude = handler(move |ctx| {
            ctx.stamp(stamped_method.clone(), Arc::clone(&route_path));
            Ok(())
        });

        let mut chain = Vec::with_capacity(handlers.len() + 1);
        chain.push(prelude);
        chain.extend(handlers);
        assert_chain_len(chain.len());

        tracing::debug!(%method, path, handlers = chain.len(), "route registered");
        self.trees
            .get_or_create(method)
            .insert(path, HandlersChain::from(chain));
    }

    /// Lists the registered `(method, pattern)` pairs.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.trees
            .iter()
            .flat_map(|(method, tree)| tree.routes().map(move |path| (method, path)))
    }

    // Dispatch

    /// Runs the handler chain matching the request in `exchange`.
    ///
    /// Errors reported by handlers are rendered into `exchange` and never
    /// returned. A handler panic unwinds out of this call unless a recovery
    /// middleware is installed.
    pub fn dispatch(&self, exchange: &mut dyn Exchange) {
        match &self.logger {
            Some(logger) => tracing::dispatcher::with_default(logger, || self.serve(exchange)),
            None => self.serve(exchange),
        }
    }

    fn serve(&self, exchange: &mut dyn Exchange) {
        let mut slot = self.pool.acquire();
        let method = exchange.method().clone();

        let (chain, allowed) = {
            let path = exchange.path();
            let found = self.trees.get(&method).and_then(|tree| {
                let lookup = tree.find(path, &mut slot.params);
                slot.tsr = lookup.tsr;
                lookup.value.cloned()
            });

            match found {
                Some(chain) => (chain, Vec::new()),
                None => {
                    let allowed = if self.handle_method_not_allowed {
                        self.trees.allowed(path)
                    } else {
                        Vec::new()
                    };
                    if allowed.is_empty() {
                        tracing::trace!(%method, path, "no route");
                        (Arc::clone(&self.all_no_route), allowed)
                    } else {
                        tracing::trace!(%method, path, "method not allowed");
                        (Arc::clone(&self.all_no_method), allowed)
                    }
                }
            }
        };

        if !allowed.is_empty() {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                exchange.set_header(ALLOW, value);
            }
        }

        slot.handlers = Some(chain);
        Context::new(exchange, self, &mut slot).next();
        self.pool.release(slot);
    }
}

impl Routes for Engine {
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = HandlerFunc>,
    ) -> &mut Self {
        let handlers = combine_handlers(&self.middleware, handlers);
        self.add_route(method, path, handlers);
        self
    }

    /// Appends global middleware.
    ///
    /// It wraps routes registered afterwards and both fallback chains.
    fn use_middleware(&mut self, middleware: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.middleware.extend(middleware);
        self.rebuild_404_handlers();
        self.rebuild_405_handlers();
        self
    }
}

#[allow(clippy::cast_sign_loss)]
fn assert_chain_len(len: usize) {
    assert!(
        len < ABORT_INDEX as usize,
        "[trellis engine]: too many handlers ({len}), a chain holds at most {}",
        ABORT_INDEX - 1
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::HttpExchange;

    fn ok() -> HandlerFunc {
        handler(|_| Ok(()))
    }

    #[test]
    fn test_new_rejects_zero_timeout() {
        let config = EngineConfig {
            timeout: std::time::Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn test_set_config_keeps_previous_on_error() {
        let engine = Engine::default();
        let bad = EngineConfig {
            timeout: std::time::Duration::ZERO,
            ..EngineConfig::with_address("0.0.0.0:1")
        };
        assert!(engine.set_config(bad).is_err());
        assert_eq!(engine.config().address, "127.0.0.1:8080");

        engine
            .set_config(EngineConfig::with_address("0.0.0.0:9000"))
            .unwrap();
        assert_eq!(engine.config().address, "0.0.0.0:9000");
    }

    #[test]
    fn test_method_config() {
        let engine = Engine::default();
        assert!(engine.method_config("/slow").is_none());
        engine.set_method_config(
            "/slow",
            MethodConfig {
                timeout: std::time::Duration::from_secs(30),
            },
        );
        assert_eq!(
            engine.method_config("/slow").map(|mc| mc.timeout),
            Some(std::time::Duration::from_secs(30))
        );
    }

    #[test]
    fn test_routes_listing() {
        let mut engine = Engine::default();
        engine.get("/a", [ok()]).post("/a", [ok()]).get("/b/:id", [ok()]);

        let mut routes: Vec<_> = engine
            .routes()
            .map(|(m, p)| (m.clone(), p.to_string()))
            .collect();
        routes.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        assert_eq!(
            routes,
            vec![
                (Method::GET, "/a".to_string()),
                (Method::GET, "/b/:id".to_string()),
                (Method::POST, "/a".to_string()),
            ]
        );
    }

    #[test]
    fn test_any_registers_every_method() {
        let mut engine = Engine::default();
        engine.any("/ping", [ok()]);
        assert_eq!(engine.routes().count(), 9);
    }

    #[test]
    fn test_slot_returns_to_pool() {
        let mut engine = Engine::default();
        engine.get("/", [ok()]);
        assert_eq!(engine.idle_contexts(), 0);

        let mut exchange = HttpExchange::new(Method::GET, "/");
        engine.dispatch(&mut exchange);
        engine.dispatch(&mut exchange);
        assert_eq!(engine.idle_contexts(), 1);
    }

    #[test]
    #[should_panic(expected = "[trellis engine]: path must begin with '/'")]
    fn test_relative_root_path_panics() {
        let mut engine = Engine::default();
        engine.get("users", [ok()]);
    }

    #[test]
    #[should_panic(expected = "[trellis engine]: there must be at least one handler")]
    fn test_route_without_handlers_panics() {
        let mut engine = Engine::default();
        engine.get("/empty", []);
    }

    #[test]
    #[should_panic(expected = "[trellis engine]: too many handlers")]
    fn test_oversized_chain_panics() {
        let mut engine = Engine::default();
        let handlers: Vec<_> = (0..ABORT_INDEX).map(|_| ok()).collect();
        engine.get("/big", handlers);
    }

    #[test]
    #[should_panic(expected = "[trellis engine]: too many handlers")]
    fn test_oversized_global_middleware_panics() {
        let mut engine = Engine::default();
        let middleware: Vec<_> = (0..ABORT_INDEX).map(|_| ok()).collect();
        engine.use_middleware(middleware);
    }
}
