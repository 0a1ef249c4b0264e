//! Panic recovery middleware.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use crate::chain::Next;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;
use crate::sink::ResponseSink;

/// Catches panics from the rest of the chain and replies `500`.
///
/// Mount it first: it only protects handlers downstream of itself. Because
/// responses are buffered, any partial output a panicking handler produced
/// is discarded rather than sent alongside the error page.
///
/// The chain itself deliberately provides no try/catch around continuations;
/// this component is the place where that policy lives.
pub struct Recovery;

impl Recovery {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Recovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Recovery {
    fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            let downstream = AssertUnwindSafe(next.run(&mut *req, &mut *sink));
            if let Err(panic) = downstream.catch_unwind().await {
                error!(
                    method = %req.method(),
                    path = req.path(),
                    panic = panic_message(panic.as_ref()),
                    "handler panicked"
                );
                sink.respond(Response::status(StatusCode::INTERNAL_SERVER_ERROR));
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
