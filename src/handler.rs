//! Handler traits and the plain-handler adapter.
//!
//! # Two kinds of handler
//!
//! A **pipeline-aware** handler receives the continuation and decides whether
//! the rest of the chain runs at all:
//!
//! ```text
//! fn serve(&self, req: &mut Request, sink: &mut ResponseSink, next: Next<'_>)
//! ```
//!
//! Work before `next.run(...)` happens on the way *in*; work after it happens
//! on the way *out* (that is how [`Logger`](crate::middleware::Logger)
//! measures latency). Skipping `next.run(...)` entirely short-circuits the
//! chain — auth rejections and cache hits live here.
//!
//! A **plain** handler never sees the continuation:
//!
//! ```text
//! fn handle(&self, req: &mut Request, sink: &mut ResponseSink)
//! ```
//!
//! [`Wrap`] adapts it into a pipeline-aware handler that always yields to the
//! next node after the plain handler returns, so a plain handler can never
//! stall the chain.
//!
//! # Calling the continuation twice
//!
//! You can't. [`Next::run`](crate::Next::run) takes `Next` by value, so the
//! compiler enforces at-most-once instead of leaving it as a convention.

use std::future::Future;
use std::pin::Pin;

use crate::chain::Next;
use crate::request::Request;
use crate::sink::ResponseSink;

/// A type-erased future borrowing the request and sink it works on.
///
/// Boxing is what keeps `Handler` object-safe: the chain stores
/// `Arc<dyn Handler>` nodes, and a trait object cannot name each handler's
/// concrete future type. One heap allocation per handler per request.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A middleware component in the pipeline.
///
/// `serve` is invoked once per request that reaches this link. The handler
/// may read or mutate the request, write to the sink, and invoke `next` to
/// hand control to the rest of the chain.
///
/// `Send + Sync + 'static` because one built chain serves many concurrent
/// requests; a handler holding per-request state is a bug — keep state in
/// the request or sink instead.
pub trait Handler: Send + Sync + 'static {
    fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a>;
}

/// Adapts a pipeline-aware function into a [`Handler`].
///
/// ```rust
/// use relay::{BoxFuture, HandlerFn, Next, Pipeline, Request, ResponseSink};
///
/// fn tag<'a>(req: &'a mut Request, sink: &'a mut ResponseSink, next: Next<'a>) -> BoxFuture<'a> {
///     Box::pin(async move {
///         sink.header("x-served-by", "relay");
///         next.run(req, sink).await;
///     })
/// }
///
/// let pipeline = Pipeline::new();
/// pipeline.push(HandlerFn(tag));
/// ```
pub struct HandlerFn<F>(pub F);

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseSink, Next<'a>) -> BoxFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        (self.0)(req, sink, next)
    }
}

/// A handler with no knowledge of the chain.
///
/// Implement this for terminal application logic, or for components ported
/// from continuation-free frameworks. Mount with
/// [`Pipeline::push_plain`](crate::Pipeline::push_plain) or wrap manually
/// with [`Wrap`].
pub trait PlainHandler: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: &'a mut Request, sink: &'a mut ResponseSink) -> BoxFuture<'a>;
}

/// Adapts a [`PlainHandler`] into a [`Handler`] that always continues.
///
/// The continuation runs after the plain handler returns, unconditionally —
/// downstream handlers still get a look at the exchange even when the plain
/// handler wrote a response.
pub struct Wrap<H>(pub H);

impl<H: PlainHandler> Handler for Wrap<H> {
    fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            self.0.handle(&mut *req, &mut *sink).await;
            next.run(req, sink).await;
        })
    }
}

/// Adapts a plain function into a [`PlainHandler`].
pub struct PlainFn<F>(pub F);

impl<F> PlainHandler for PlainFn<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut ResponseSink) -> BoxFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(&'a self, req: &'a mut Request, sink: &'a mut ResponseSink) -> BoxFuture<'a> {
        (self.0)(req, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use http::Method;

    fn tag<'a>(
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            sink.header("x-tag", "1");
            next.run(req, sink).await;
        })
    }

    fn reply<'a>(_req: &'a mut Request, sink: &'a mut ResponseSink) -> BoxFuture<'a> {
        Box::pin(async move {
            sink.write(b"done");
        })
    }

    #[tokio::test]
    async fn fn_items_act_as_handlers() {
        let pipeline = Pipeline::new();
        pipeline.push_fn(tag);
        pipeline.push_plain_fn(reply);

        let mut req = Request::new(Method::GET, "/");
        let mut sink = ResponseSink::new();
        pipeline.dispatch(&mut req, &mut sink).await;

        assert!(sink.written());
        let response = sink.into_inner();
        assert!(response.headers().iter().any(|(k, v)| k == "x-tag" && v == "1"));
        assert_eq!(response.body(), b"done");
    }

    #[tokio::test]
    async fn headers_alone_do_not_mark_the_sink_written() {
        let pipeline = Pipeline::new();
        pipeline.push(HandlerFn(tag));

        let mut req = Request::new(Method::GET, "/");
        let mut sink = ResponseSink::new();
        pipeline.dispatch(&mut req, &mut sink).await;

        assert!(!sink.written());
    }
}
