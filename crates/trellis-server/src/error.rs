//! Server error types.

use thiserror::Error;

/// Errors returned while starting or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured network is not `tcp`, `tcp4` or `tcp6`.
    #[error("[trellis engine]: unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The address did not resolve to a usable socket address.
    #[error("[trellis engine]: invalid address {address} for network {network}")]
    InvalidAddress {
        /// Network the address was resolved for.
        network: String,
        /// The configured address.
        address: String,
    },

    /// Binding the listener failed.
    #[error("[trellis engine]: listen {network}: {address}")]
    Bind {
        /// Network being bound.
        network: String,
        /// Address being bound.
        address: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
