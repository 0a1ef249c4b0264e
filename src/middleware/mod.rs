//! Bundled middleware.
//!
//! The three components [`Pipeline::classic`](crate::Pipeline::classic)
//! installs. The pipeline treats them as opaque handlers — nothing here is
//! special-cased by the chain, and each is an ordinary
//! [`Handler`](crate::Handler) you could have written yourself:
//!
//! - [`Recovery`] — converts a downstream panic into a `500`
//! - [`Logger`] — structured per-request log line with status and latency
//! - [`Static`] — serves files from a directory, falls through on miss
//!
//! Order matters: recovery wraps everything below it, so it goes first.

mod logger;
mod recovery;
mod static_files;

pub use logger::Logger;
pub use recovery::Recovery;
pub use static_files::Static;
