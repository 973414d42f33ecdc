//! Request logging middleware.
//!
//! Records one `tracing` event per request after the rest of the chain has
//! run, with these fields:
//!
//! - `method` - request method
//! - `path` - request path
//! - `route` - matched pattern, `-` for fallbacks
//! - `status` - response status
//! - `latency_ms` - time spent in the chain
//!
//! Responses with a 5xx status are logged at `warn`, everything else at
//! `info`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use trellis_core::{handler, HandlerFunc};

/// Builder for the request logging middleware.
///
/// # Example
///
/// ```
/// use trellis_middleware::RequestLogger;
///
/// let logger = RequestLogger::new()
///     .skip_path("/health")
///     .into_handler();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    skip_paths: HashSet<String>,
}

impl RequestLogger {
    /// Creates a logger that records every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes requests whose path equals `path`.
    #[must_use]
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.insert(path.into());
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn into_handler(self) -> HandlerFunc {
        let skip_paths = Arc::new(self.skip_paths);
        handler(move |ctx| {
            if skip_paths.contains(ctx.path()) {
                ctx.next();
                return Ok(());
            }

            let start = Instant::now();
            ctx.next();
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            let status = ctx.response_status();
            let route = ctx.route_path().unwrap_or("-");
            if status.is_server_error() {
                tracing::warn!(
                    method = %ctx.method(),
                    path = ctx.path(),
                    route,
                    status = status.as_u16(),
                    latency_ms,
                    "request completed"
                );
            } else {
                tracing::info!(
                    method = %ctx.method(),
                    path = ctx.path(),
                    route,
                    status = status.as_u16(),
                    latency_ms,
                    "request completed"
                );
            }
            Ok(())
        })
    }
}

/// Creates the request logging middleware with default settings.
pub fn logger() -> HandlerFunc {
    RequestLogger::new().into_handler()
}
