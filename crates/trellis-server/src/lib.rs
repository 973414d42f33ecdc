//! # Trellis Server
//!
//! A hyper 1.x listener for a Trellis [`Engine`](trellis_core::Engine).
//!
//! The engine's [`EngineConfig`](trellis_core::EngineConfig) decides what is
//! bound (`network` of `tcp`, `tcp4` or `tcp6`, plus `address`), how long
//! header reads may take (`read_timeout`) and how long dispatch may run
//! (`timeout`, overridden per path by `Engine::set_method_config`). A
//! dispatch that overruns is answered with `504`.
//!
//! Shutdown stops accepting, lets open connections finish their current
//! request and returns `Ok(())`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod server;
mod shutdown;

pub use error::ServerError;
pub use server::{
    ResponseBody, Server, DEFAULT_SHUTDOWN_TIMEOUT, PANIC_BODY, TIMEOUT_BODY,
};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
