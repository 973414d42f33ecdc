//! # Trellis Middleware
//!
//! Optional middleware for Trellis engines.
//!
//! | Middleware | Purpose |
//! |---|---|
//! | [`recovery()`] | Converts handler panics into reported errors (500) |
//! | [`logger()`] | Logs method, path, route, status and latency per request |
//!
//! Install recovery first so it covers every handler after it:
//!
//! ```
//! use trellis_core::{Engine, Routes};
//! use trellis_middleware::{logger, recovery};
//!
//! let mut engine = Engine::default();
//! engine.use_middleware([recovery(), logger()]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod logger;
mod recovery;

pub use logger::{logger, RequestLogger};
pub use recovery::recovery;
