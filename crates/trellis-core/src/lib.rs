//! # Trellis Core
//!
//! The request execution pipeline of Trellis.
//!
//! - [`Engine`] - Route table, fallback chains, context pool and dispatch
//! - [`Context`] - Per-request state driven through a handler chain
//! - [`Routes`] / [`RouterGroup`] - Route registration with shared prefixes
//!   and middleware
//! - [`Exchange`] / [`HttpExchange`] - The transport handle a dispatch reads
//!   from and writes to
//! - [`Error`] / [`HttpError`] - Errors reported by handlers
//!
//! # Example
//!
//! ```
//! use trellis_core::{handler, Engine, Exchange, HttpError, HttpExchange, Routes};
//! use http::{Method, StatusCode};
//!
//! let mut engine = Engine::default();
//! let mut admin = engine.group("/admin", [handler(|ctx| {
//!     if ctx.query("token").as_deref() != Some("secret") {
//!         return Err(HttpError::forbidden().with_message("bad token").into());
//!     }
//!     Ok(())
//! })]);
//! admin.get("/stats", [handler(|ctx| {
//!     ctx.string(StatusCode::OK, "all good");
//!     Ok(())
//! })]);
//!
//! let mut denied = HttpExchange::new(Method::GET, "/admin/stats");
//! engine.dispatch(&mut denied);
//! assert_eq!(denied.status(), StatusCode::FORBIDDEN);
//! assert_eq!(denied.response_body().as_ref(), b"bad token");
//!
//! let mut allowed = HttpExchange::new(Method::GET, "/admin/stats?token=secret");
//! engine.dispatch(&mut allowed);
//! assert_eq!(allowed.status(), StatusCode::OK);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod context;
mod engine;
mod error;
mod exchange;
mod group;
mod handler;
mod pool;

pub use config::{EngineConfig, MethodConfig};
pub use context::{Context, ABORT_INDEX, TEXT_PLAIN_UTF8};
pub use engine::{Engine, DEFAULT_404_BODY, DEFAULT_405_BODY};
pub use error::{ConfigError, Error, HandlerResult, HttpError};
pub use exchange::{Exchange, HttpExchange};
pub use group::{RouterGroup, Routes, ANY_METHODS};
pub use handler::{error_handler, handler, ErrorHandler, HandlerFunc, HandlersChain};
pub use pool::DEFAULT_POOL_CAPACITY;
pub use trellis_router::Params;
