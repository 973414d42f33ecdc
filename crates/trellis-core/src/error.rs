//! Error types for Trellis.
//!
//! Handlers return [`Error`]. The context routes it to the engine's error
//! handler, or to the default one, which writes the status code carried by
//! the error (500 when there is none) and the error message as plain text.
//!
//! | Variant | Status |
//! |---|---|
//! | `Http` | the carried code |
//! | `Panic` | none (default handler uses 500) |
//! | `Other` | none (default handler uses 500) |

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Result type returned by handlers.
pub type HandlerResult = Result<(), Error>;

/// An HTTP error with a status code and a message.
///
/// # Example
///
/// ```
/// use trellis_core::HttpError;
/// use http::StatusCode;
///
/// let err = HttpError::new(StatusCode::FORBIDDEN);
/// assert_eq!(err.message(), "Forbidden");
///
/// let err = HttpError::forbidden().with_message("members only");
/// assert_eq!(err.code(), StatusCode::FORBIDDEN);
/// assert_eq!(err.to_string(), "members only");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpError {
    code: StatusCode,
    message: String,
}

impl HttpError {
    /// Creates an error whose message is the canonical reason of `code`.
    #[must_use]
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            message: code.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Replaces the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// 405 Method Not Allowed.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// 429 Too Many Requests.
    #[must_use]
    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS)
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// 502 Bad Gateway.
    #[must_use]
    pub fn bad_gateway() -> Self {
        Self::new(StatusCode::BAD_GATEWAY)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// 408 Request Timeout.
    #[must_use]
    pub fn request_timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT)
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn service_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Error reported by a handler.
#[derive(Error, Debug)]
pub enum Error {
    /// An error that maps to a specific HTTP status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A panic caught by the recovery middleware.
    #[error("panic: {0}")]
    Panic(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Returns the status code carried by the error, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Http(err) => Some(err.code),
            Self::Panic(_) | Self::Other(_) => None,
        }
    }

    /// Creates an [`Error::Other`] from a message.
    #[must_use]
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }
}

impl From<StatusCode> for Error {
    fn from(code: StatusCode) -> Self {
        Self::Http(HttpError::new(code))
    }
}

/// Engine configuration validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The dispatch timeout was zero.
    #[error("[trellis engine]: config timeout must be greater than 0, got {0:?}")]
    InvalidTimeout(Duration),
}
