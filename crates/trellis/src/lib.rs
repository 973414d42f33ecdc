//! # Trellis
//!
//! An embeddable HTTP request-dispatch core: a radix route tree with
//! `:param` and `*catchall` segments, route groups, and a middleware
//! pipeline driven by a cursor over each route's handler chain.
//!
//! | Crate | Re-exported as |
//! |---|---|
//! | `trellis-router` | [`router`] |
//! | `trellis-core` | [`core`] |
//! | `trellis-middleware` | [`middleware`] |
//! | `trellis-telemetry` | [`telemetry`] |
//! | `trellis-config` | [`config`] |
//! | `trellis-server` | [`server`] |
//!
//! # Example
//!
//! ```
//! use trellis::prelude::*;
//!
//! let mut engine = Engine::default();
//! engine.use_middleware([recovery()]);
//!
//! let mut api = engine.group("/api", []);
//! api.get("/users/:id", [handler(|ctx| {
//!     let id = ctx.param("id").unwrap_or_default().to_string();
//!     ctx.string(StatusCode::OK, id);
//!     Ok(())
//! })]);
//!
//! let mut exchange = HttpExchange::new(Method::GET, "/api/users/42");
//! engine.dispatch(&mut exchange);
//! assert_eq!(exchange.status(), StatusCode::OK);
//! assert_eq!(exchange.response_body().as_ref(), b"42");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use trellis_config as config;
pub use trellis_core as core;
pub use trellis_middleware as middleware;
pub use trellis_router as router;
pub use trellis_server as server;
pub use trellis_telemetry as telemetry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use http::{Method, StatusCode};

    pub use trellis_config::{ConfigLoader, TrellisConfig};
    pub use trellis_core::{
        error_handler, handler, Context, Engine, EngineConfig, Error, Exchange, HandlerFunc,
        HandlerResult, HttpError, HttpExchange, MethodConfig, RouterGroup, Routes,
    };
    pub use trellis_middleware::{logger, recovery, RequestLogger};
    pub use trellis_server::{Server, ShutdownSignal};
    pub use trellis_telemetry::{build_dispatch, LogConfig, LogFormat};
}
