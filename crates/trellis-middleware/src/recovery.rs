//! Panic recovery middleware.
//!
//! Without this middleware a panicking handler unwinds out of
//! [`Engine::dispatch`](trellis_core::Engine::dispatch). Installed first in
//! the chain, it runs the rest of the chain under `catch_unwind` and turns a
//! panic into [`Error::Panic`], reported through the context like any other
//! handler error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use trellis_core::{handler, Error, HandlerFunc};

/// Creates the recovery middleware.
///
/// # Example
///
/// ```
/// use trellis_core::{handler, Engine, Exchange, HttpExchange, Routes};
/// use trellis_middleware::recovery;
/// use http::{Method, StatusCode};
///
/// let mut engine = Engine::default();
/// engine.use_middleware([recovery()]);
/// engine.get("/boom", [handler(|_| panic!("kaboom"))]);
///
/// let mut exchange = HttpExchange::new(Method::GET, "/boom");
/// engine.dispatch(&mut exchange);
/// assert_eq!(exchange.status(), StatusCode::INTERNAL_SERVER_ERROR);
/// ```
pub fn recovery() -> HandlerFunc {
    handler(|ctx| {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| ctx.next())) {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                method = %ctx.method(),
                path = ctx.path(),
                route = ctx.route_path().unwrap_or_default(),
                panic = %message,
                "handler panicked"
            );
            ctx.report(Error::Panic(message));
        }
        Ok(())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
