//! HTTP listener driving an [`Engine`].
//!
//! The server owns sockets and connections; the engine owns routing. Each
//! request is read fully, adapted into an [`HttpExchange`], dispatched on
//! Tokio's blocking pool under the request timeout and written back.
//!
//! ```text
//!  TcpListener ─► http1 connection ─► collect body ─► HttpExchange
//!                                                       │
//!             Response ◄─ into_response ◄─ Engine::dispatch (spawn_blocking + timeout)
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use trellis_core::{Engine, HttpExchange, TEXT_PLAIN_UTF8};

use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Body type of every response the server writes.
pub type ResponseBody = Full<Bytes>;

/// Body written when dispatch exceeds its timeout.
pub const TIMEOUT_BODY: &str = "504 gateway timeout";

/// Body written when a handler panicked without a recovery middleware.
pub const PANIC_BODY: &str = "500 internal server error";

/// Default time to wait for open connections after shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The Trellis HTTP server.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use trellis_core::{handler, Engine, Routes};
/// use trellis_server::Server;
/// use http::StatusCode;
///
/// # async fn run() -> Result<(), trellis_server::ServerError> {
/// let mut engine = Engine::default();
/// engine.get("/ping", [handler(|ctx| {
///     ctx.string(StatusCode::OK, "pong");
///     Ok(())
/// })]);
///
/// Server::new(Arc::new(engine)).start().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Server {
    engine: Arc<Engine>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server for `engine`.
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Returns the engine requests are dispatched to.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Binds the engine's configured network and address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let config = self.engine.config();
        let addr = resolve(&config.network, &config.address).await?;
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                network: config.network.clone(),
                address: config.address.clone(),
                source,
            })
    }

    /// Binds and serves until SIGINT or SIGTERM.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds and serves until `shutdown` is triggered.
    pub async fn run_with_shutdown(&self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// is triggered, then waits for open connections to finish.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        tracing::info!(address = %listener.local_addr()?, "start http listen");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let engine = Arc::clone(&self.engine);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(engine, stream, remote, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        drop(listener);
        tracing::info!(
            connections = tracker.active_connections(),
            "shutting down, waiting for open connections"
        );
        if tokio::time::timeout(self.shutdown_timeout, tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }
        tracing::info!("server closed");
        Ok(())
    }
}

async fn resolve(network: &str, address: &str) -> Result<SocketAddr, ServerError> {
    let wants: fn(&SocketAddr) -> bool = match network {
        "tcp" | "" => |_| true,
        "tcp4" => SocketAddr::is_ipv4,
        "tcp6" => SocketAddr::is_ipv6,
        other => return Err(ServerError::UnsupportedNetwork(other.to_string())),
    };

    // ":8080" binds every interface.
    let target = if address.starts_with(':') {
        let any = if network == "tcp6" { "[::]" } else { "0.0.0.0" };
        format!("{any}{address}")
    } else {
        address.to_string()
    };

    let invalid = || ServerError::InvalidAddress {
        network: network.to_string(),
        address: address.to_string(),
    };
    let found = tokio::net::lookup_host(target.as_str())
        .await
        .map_err(|_| invalid())?
        .find(wants);
    found.ok_or_else(invalid)
}

async fn serve_connection(
    engine: Arc<Engine>,
    stream: TcpStream,
    remote: SocketAddr,
    shutdown: ShutdownSignal,
) {
    let read_timeout = engine.config().read_timeout;
    let service = service_fn(move |request| handle_request(Arc::clone(&engine), request));

    let mut builder = http1::Builder::new();
    builder.timer(TokioTimer::new());
    if !read_timeout.is_zero() {
        builder.header_read_timeout(read_timeout);
    }

    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.recv() => {
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };
    if let Err(e) = result {
        tracing::debug!(%remote, error = %e, "connection closed with error");
    }
}

async fn handle_request(
    engine: Arc<Engine>,
    request: Request<Incoming>,
) -> Result<Response<ResponseBody>, Infallible> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            return Ok(plain(StatusCode::BAD_REQUEST, "400 bad request"));
        }
    };

    let path = parts.uri.path().to_string();
    let timeout = engine
        .method_config(&path)
        .map_or_else(|| engine.config().timeout, |config| config.timeout);

    let mut exchange = HttpExchange::from_request(Request::from_parts(parts, body));
    let dispatch = tokio::task::spawn_blocking(move || {
        engine.dispatch(&mut exchange);
        exchange
    });

    let response = match tokio::time::timeout(timeout, dispatch).await {
        Ok(Ok(exchange)) => exchange.into_response().map(Full::new),
        Ok(Err(e)) => {
            tracing::error!(path = %path, error = %e, "dispatch failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, PANIC_BODY)
        }
        Err(_) => {
            tracing::warn!(path = %path, ?timeout, "dispatch timed out");
            plain(StatusCode::GATEWAY_TIMEOUT, TIMEOUT_BODY)
        }
    };
    Ok(response)
}

fn plain(status: StatusCode, body: &'static str) -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_networks() {
        let v4 = resolve("tcp4", "127.0.0.1:8080").await.unwrap();
        assert!(v4.is_ipv4());

        let any = resolve("tcp", "127.0.0.1:0").await.unwrap();
        assert_eq!(any.port(), 0);

        let v6 = resolve("tcp6", "[::1]:8080").await.unwrap();
        assert!(v6.is_ipv6());
    }

    #[tokio::test]
    async fn test_resolve_port_only() {
        let addr = resolve("tcp", ":9000").await.unwrap();
        assert_eq!(addr, "0.0.0.0:9000".parse().unwrap());

        let addr = resolve("tcp6", ":9000").await.unwrap();
        assert_eq!(addr, "[::]:9000".parse().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_hostname() {
        let addr = resolve("tcp4", "localhost:9000").await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 9000);
    }

    #[tokio::test]
    async fn test_resolve_family_mismatch() {
        let result = resolve("tcp6", "127.0.0.1:8080").await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_resolve_unsupported_network() {
        let result = resolve("unix", "/tmp/trellis.sock").await;
        assert!(matches!(result, Err(ServerError::UnsupportedNetwork(n)) if n == "unix"));
    }

    #[tokio::test]
    async fn test_resolve_garbage_address() {
        let result = resolve("tcp", "not an address").await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[test]
    fn test_plain_response() {
        let response = plain(StatusCode::GATEWAY_TIMEOUT, TIMEOUT_BODY);
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_PLAIN_UTF8);
    }

    #[tokio::test]
    async fn test_shutdown_before_accept_is_clean() {
        let server = Server::new(Arc::new(Engine::default()))
            .with_shutdown_timeout(Duration::from_millis(100));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), server.serve(listener, shutdown))
            .await
            .unwrap();
        assert!(result.is_ok());
    }
}
