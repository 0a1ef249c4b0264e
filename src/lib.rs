//! # relay
//!
//! A minimal middleware pipeline for Rust HTTP services.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! relay sequences opaque handlers. Each handler receives the request, the
//! response sink, and a continuation for the rest of the chain — and decides
//! whether that continuation runs at all. That is the entire mechanism.
//!
//! What relay intentionally does **not** do:
//!
//! - **Routing** — no path matching, no parameter extraction. Mount a router
//!   as the last handler if you want one.
//! - **Error plumbing** — handlers never return errors to the pipeline.
//!   Failure policy is itself middleware; see
//!   [`middleware::Recovery`].
//! - **Concurrency control** — the chain is immutable once built, so
//!   dispatching thousands of requests against it needs no locks. The only
//!   per-request mutable state is the request and its sink, and those are
//!   never shared.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use relay::{BoxFuture, Config, Pipeline, PlainHandler, Request, Response, ResponseSink, Server};
//!
//! struct App;
//!
//! impl PlainHandler for App {
//!     fn handle<'a>(&'a self, _req: &'a mut Request, sink: &'a mut ResponseSink) -> BoxFuture<'a> {
//!         Box::pin(async move {
//!             sink.respond(Response::text("hello"));
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Recovery, request logging, static files — then your app.
//!     let app = Pipeline::classic();
//!     app.push_plain(App);
//!
//!     Server::from_config(&Config::resolve(None))
//!         .serve(app)
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Execution model
//!
//! `Pipeline::push` compiles the handler list into an immutable linked chain
//! ending in a no-op sentinel. Dispatch walks that chain: each node hands its
//! handler a [`Next`] bound to the successor. A handler that drops `Next`
//! unused short-circuits; one that awaits `next.run(...)` sees the rest of
//! the chain finish before its own tail code runs — which is how logging and
//! recovery middleware observe the response on the way out.
//!
//! Appending to a live pipeline atomically swaps in a freshly built chain.
//! Requests already in flight finish on the chain they started with.

mod chain;
mod config;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod server;
mod sink;

pub mod middleware;

pub use chain::Next;
pub use config::{Config, DEFAULT_ADDRESS};
pub use error::Error;
pub use handler::{BoxFuture, Handler, HandlerFn, PlainFn, PlainHandler, Wrap};
pub use pipeline::Pipeline;
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use server::Server;
pub use sink::ResponseSink;

// Handlers speak these types directly; re-exported so applications don't
// need an explicit `http` dependency.
pub use http::{Method, StatusCode};
