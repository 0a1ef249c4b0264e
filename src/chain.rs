//! The built middleware chain.
//!
//! A pipeline's handler list is compiled into a singly linked chain of
//! immutable nodes. Each node pairs one handler with its successor, so at
//! request time invoking a handler costs one vtable call and nothing else —
//! no list walking, no index bookkeeping.
//!
//! The chain is built back-to-front: fold the handler list from its tail over
//! the terminal sentinel, wrapping one more node around the already-built
//! remainder at each step. That way every node's successor exists the moment
//! the node is constructed, and no node is ever touched again afterwards.
//! Rebuilds (on append) produce an entirely new chain; requests running
//! against the old one are unaffected.

use std::sync::Arc;

use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::sink::ResponseSink;

/// One link: a handler plus a ready-to-call reference to the rest of the chain.
///
/// `next` is `None` only on the sentinel, whose handler never invokes its
/// continuation anyway.
pub(crate) struct ChainNode {
    handler: Arc<dyn Handler>,
    next: Option<Arc<ChainNode>>,
}

impl ChainNode {
    /// Runs this link's handler with the continuation bound to the successor.
    pub(crate) fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a> {
        self.handler.serve(req, sink, Next { node: self.next.as_deref() })
    }
}

/// The continuation handed to a [`Handler`]: the rest of the chain.
///
/// Consumed by [`run`](Next::run) — a continuation can be invoked at most
/// once, and dropping it unused is how a handler short-circuits.
pub struct Next<'a> {
    node: Option<&'a ChainNode>,
}

impl<'a> Next<'a> {
    /// Yields control to the remainder of the chain.
    pub async fn run(self, req: &mut Request, sink: &mut ResponseSink) {
        if let Some(node) = self.node {
            node.serve(req, sink).await;
        }
    }
}

/// Compiles an ordered handler list into a chain of `handlers.len() + 1`
/// nodes: one per handler, terminated by the sentinel. An empty list yields
/// the sentinel alone.
pub(crate) fn build(handlers: &[Arc<dyn Handler>]) -> Arc<ChainNode> {
    handlers.iter().rev().fold(sentinel(), |next, handler| {
        Arc::new(ChainNode { handler: Arc::clone(handler), next: Some(next) })
    })
}

/// Terminal node. Its handler does nothing and drops the continuation.
fn sentinel() -> Arc<ChainNode> {
    Arc::new(ChainNode { handler: Arc::new(Void), next: None })
}

struct Void;

impl Handler for Void {
    fn serve<'a>(
        &'a self,
        _req: &'a mut Request,
        _sink: &'a mut ResponseSink,
        _next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async {})
    }
}
