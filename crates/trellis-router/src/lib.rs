//! Radix tree router for Trellis.
//!
//! This crate holds the matching half of Trellis: a compressed prefix tree
//! keyed by path bytes, one tree per HTTP method, and the parameter
//! container filled in by a match. It knows nothing about handlers; the
//! stored value is generic.
//!
//! # Features
//!
//! - **Radix Tree Matching**: O(k) lookup in the path length, first-byte
//!   dispatch among static children
//! - **Path Parameters**: `:name` binds one non-empty segment
//! - **Catch-all**: a final `*name` binds the rest of the path
//! - **Trailing Slash Hint**: a miss reports whether toggling the trailing
//!   slash would hit
//! - **Reusable Params**: bindings go into a caller-owned [`Params`] that can
//!   be truncated and refilled without reallocating
//!
//! # Example
//!
//! ```rust
//! use trellis_router::{MethodTrees, Params};
//! use http::Method;
//!
//! let mut trees = MethodTrees::new();
//! trees.get_or_create(Method::GET).insert("/user/new", "newUser");
//! trees.get_or_create(Method::GET).insert("/user/:id", "getUser");
//!
//! let tree = trees.get(&Method::GET).unwrap();
//! let mut params = Params::new();
//!
//! let lookup = tree.find("/user/99", &mut params);
//! assert_eq!(lookup.value, Some(&"getUser"));
//! assert_eq!(params.get("id"), Some("99"));
//! ```
//!
//! # Architecture
//!
//! Patterns sharing a prefix share nodes. Registering `/user/new`,
//! `/user/:id/post/:pid` and `/users` produces:
//!
//! ```text
//!                 "/user"
//!                    │
//!          ┌─────────┴─────────┐
//!          │                   │
//!         "/"                 "s"
//!          │                (leaf)
//!     ┌────┴─────┐
//!     │          │
//!   "new"      :id
//!  (leaf)        │
//!            "/post/"
//!                │
//!              :pid
//!             (leaf)
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod method_trees;
mod params;
mod path;
mod tree;

pub use method_trees::MethodTrees;
pub use params::Params;
pub use path::{clean_path, join_paths};
pub use tree::{Lookup, Tree};
