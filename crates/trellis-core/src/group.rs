//! Route registration and route groups.

use http::Method;
use trellis_router::join_paths;

use crate::engine::Engine;
use crate::handler::HandlerFunc;

/// Methods registered by [`Routes::any`].
pub const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::DELETE,
    Method::CONNECT,
    Method::TRACE,
];

/// Route registration shared by the engine and its groups.
///
/// Handlers are passed as anything iterable over [`HandlerFunc`], usually
/// an array built with [`handler`](crate::handler()).
///
/// # Panics
///
/// Registration panics on malformed or ambiguous paths and on empty or
/// oversized handler lists. These are programming errors in the route
/// table.
pub trait Routes {
    /// Registers `handlers` for `method` on `path`, relative to this group.
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = HandlerFunc>,
    ) -> &mut Self;

    /// Appends middleware used by routes registered afterwards.
    fn use_middleware(&mut self, middleware: impl IntoIterator<Item = HandlerFunc>) -> &mut Self;

    /// Registers a `GET` route.
    fn get(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::GET, path, handlers)
    }

    /// Registers a `POST` route.
    fn post(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::POST, path, handlers)
    }

    /// Registers a `PUT` route.
    fn put(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::PUT, path, handlers)
    }

    /// Registers a `DELETE` route.
    fn delete(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::DELETE, path, handlers)
    }

    /// Registers a `PATCH` route.
    fn patch(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::PATCH, path, handlers)
    }

    /// Registers a `HEAD` route.
    fn head(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::HEAD, path, handlers)
    }

    /// Registers an `OPTIONS` route.
    fn options(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handle(Method::OPTIONS, path, handlers)
    }

    /// Registers the same handlers for every standard method.
    fn any(&mut self, path: &str, handlers: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        for method in ANY_METHODS {
            self.handle(method, path, handlers.iter().cloned());
        }
        self
    }
}

/// A set of routes sharing a path prefix and middleware.
///
/// Middleware is copied into each route when the route is registered, so
/// [`Routes::use_middleware`] only affects routes added after it.
///
/// # Example
///
/// ```
/// use trellis_core::{handler, Engine, Routes};
///
/// let mut engine = Engine::default();
/// let auth = handler(|ctx| {
///     ctx.set("user", "admin".to_string());
///     Ok(())
/// });
///
/// let mut api = engine.group("/api", [auth]);
/// let mut v1 = api.group("/v1", []);
/// v1.get("/users/:id", [handler(|_| Ok(()))]);
///
/// let routes: Vec<_> = engine.routes().collect();
/// assert_eq!(routes.len(), 1);
/// assert_eq!(routes[0].1, "/api/v1/users/:id");
/// ```
pub struct RouterGroup<'e> {
    engine: &'e mut Engine,
    base_path: String,
    handlers: Vec<HandlerFunc>,
}

impl std::fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterGroup")
            .field("base_path", &self.base_path)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl<'e> RouterGroup<'e> {
    pub(crate) fn new(engine: &'e mut Engine, base_path: String, handlers: Vec<HandlerFunc>) -> Self {
        Self {
            engine,
            base_path,
            handlers,
        }
    }

    /// Creates a nested group below this one.
    pub fn group(
        &mut self,
        relative_path: &str,
        middleware: impl IntoIterator<Item = HandlerFunc>,
    ) -> RouterGroup<'_> {
        let base_path = join_paths(&self.base_path, relative_path);
        let handlers = combine_handlers(&self.handlers, middleware);
        RouterGroup::new(&mut *self.engine, base_path, handlers)
    }

    /// Returns the absolute path prefix of this group.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl Routes for RouterGroup<'_> {
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = HandlerFunc>,
    ) -> &mut Self {
        let absolute = join_paths(&self.base_path, path);
        let handlers = combine_handlers(&self.handlers, handlers);
        self.engine.add_route(method, &absolute, handlers);
        self
    }

    fn use_middleware(&mut self, middleware: impl IntoIterator<Item = HandlerFunc>) -> &mut Self {
        self.handlers.extend(middleware);
        self
    }
}

/// Concatenates inherited handlers with new ones into a fresh list.
pub(crate) fn combine_handlers(
    inherited: &[HandlerFunc],
    handlers: impl IntoIterator<Item = HandlerFunc>,
) -> Vec<HandlerFunc> {
    let mut combined = inherited.to_vec();
    combined.extend(handlers);
    combined
}
