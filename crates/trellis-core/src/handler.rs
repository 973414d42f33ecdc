//! Handler function types.

use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, HandlerResult};

/// A route handler or middleware.
pub type HandlerFunc = Arc<dyn Fn(&mut Context<'_>) -> HandlerResult + Send + Sync>;

/// The effective handler sequence of a route or fallback.
pub type HandlersChain = Arc<[HandlerFunc]>;

/// Called with the context and the error a handler reported.
pub type ErrorHandler = Arc<dyn Fn(&mut Context<'_>, &Error) + Send + Sync>;

/// Wraps a closure into a [`HandlerFunc`].
///
/// # Example
///
/// ```
/// use trellis_core::{handler, HandlerFunc};
/// use http::StatusCode;
///
/// let hello: HandlerFunc = handler(|ctx| {
///     ctx.string(StatusCode::OK, "hello");
///     Ok(())
/// });
/// ```
pub fn handler<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure into an [`ErrorHandler`].
pub fn error_handler<F>(f: F) -> ErrorHandler
where
    F: Fn(&mut Context<'_>, &Error) + Send + Sync + 'static,
{
    Arc::new(f)
}
