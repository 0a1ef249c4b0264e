//! The pipeline façade: handler list, built chain, dispatch.
//!
//! # Snapshot discipline
//!
//! A [`Pipeline`] holds its handler list and built chain head together as one
//! immutable snapshot behind an [`arc_swap::ArcSwap`]. Appending a handler
//! builds a brand-new chain and swaps the snapshot in atomically; nothing is
//! mutated in place. The consequences:
//!
//! - Appends are safe while requests are in flight. A dispatch loads the
//!   snapshot exactly once at entry and runs against it to completion, even
//!   if the pipeline is mutated mid-request.
//! - [`handlers`](Pipeline::handlers) returns a point-in-time clone that
//!   later appends cannot disturb.
//!
//! Each append rebuilds the whole chain — O(n) per `push` — in exchange for a
//! chain that is always consistent and never locked. Pipelines are assembled
//! at startup and then dispatched millions of times; that trade is the right
//! one.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::chain::{self, ChainNode, Next};
use crate::handler::{BoxFuture, Handler, HandlerFn, PlainFn, PlainHandler, Wrap};
use crate::middleware::{Logger, Recovery, Static};
use crate::request::Request;
use crate::sink::ResponseSink;

/// One immutable generation of the pipeline: the ordered handler list and
/// the chain compiled from it. Replaced wholesale on every append.
struct Snapshot {
    handlers: Vec<Arc<dyn Handler>>,
    head: Arc<ChainNode>,
}

/// An ordered stack of middleware handlers invocable as one handler.
///
/// Handlers run in the order they were appended. Each receives the
/// continuation for the rest of the chain and may withhold it to
/// short-circuit.
///
/// ```rust,no_run
/// use relay::{Config, Pipeline, Server};
/// use relay::middleware::{Logger, Recovery};
///
/// #[tokio::main]
/// async fn main() {
///     let app = Pipeline::new();
///     app.push(Recovery::new());
///     app.push(Logger::new());
///     // app.push_plain(YourApp);
///
///     Server::from_config(&Config::resolve(None))
///         .serve(app)
///         .await
///         .unwrap();
/// }
/// ```
pub struct Pipeline {
    snapshot: ArcSwap<Snapshot>,
}

impl Pipeline {
    /// An empty pipeline. Dispatching it completes immediately: the chain is
    /// just the terminal sentinel.
    pub fn new() -> Self {
        Self::from_handlers([])
    }

    /// Builds a pipeline from an initial handler list. The chain is compiled
    /// immediately, not on first dispatch.
    pub fn from_handlers(handlers: impl IntoIterator<Item = Arc<dyn Handler>>) -> Self {
        let handlers: Vec<Arc<dyn Handler>> = handlers.into_iter().collect();
        let head = chain::build(&handlers);
        Self { snapshot: ArcSwap::from_pointee(Snapshot { handlers, head }) }
    }

    /// The default stack: panic recovery, request logging, and static file
    /// serving out of `./public`. Append your application after it.
    pub fn classic() -> Self {
        let pipeline = Self::new();
        pipeline.push(Recovery::new());
        pipeline.push(Logger::new());
        pipeline.push(Static::new("public"));
        pipeline
    }

    /// Appends a handler and rebuilds the chain synchronously.
    pub fn push<H: Handler>(&self, handler: H) {
        self.push_arc(Arc::new(handler));
    }

    /// Appends an already-shared handler. Useful when one handler instance
    /// is mounted in several pipelines.
    pub fn push_arc(&self, handler: Arc<dyn Handler>) {
        self.snapshot.rcu(|current| {
            let mut handlers = current.handlers.clone();
            handlers.push(Arc::clone(&handler));
            let head = chain::build(&handlers);
            Arc::new(Snapshot { handlers, head })
        });
    }

    /// Appends a pipeline-aware function. See [`HandlerFn`].
    pub fn push_fn<F>(&self, f: F)
    where
        F: for<'a> Fn(&'a mut Request, &'a mut ResponseSink, Next<'a>) -> BoxFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.push(HandlerFn(f));
    }

    /// Appends a plain handler, adapted so the continuation always runs
    /// after it returns. See [`Wrap`].
    pub fn push_plain<H: PlainHandler>(&self, handler: H) {
        self.push(Wrap(handler));
    }

    /// Appends a plain function. See [`PlainFn`].
    pub fn push_plain_fn<F>(&self, f: F)
    where
        F: for<'a> Fn(&'a mut Request, &'a mut ResponseSink) -> BoxFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.push_plain(PlainFn(f));
    }

    /// Derives a new, independent pipeline: the receiver's current handlers
    /// followed by `extra`. The receiver is not mutated, and the two
    /// pipelines share no structure that an append could disturb.
    pub fn with(&self, extra: impl IntoIterator<Item = Arc<dyn Handler>>) -> Pipeline {
        let current = self.snapshot.load();
        Pipeline::from_handlers(current.handlers.iter().cloned().chain(extra))
    }

    /// Runs one exchange through the chain.
    ///
    /// If the sink already shows output — this exchange was dispatched
    /// before, possibly by a different integration layer — the call is a
    /// silent no-op. Otherwise the current snapshot is loaded once and the
    /// chain head invoked; appends racing with this dispatch take effect
    /// only for later requests.
    pub async fn dispatch(&self, req: &mut Request, sink: &mut ResponseSink) {
        if sink.written() {
            return;
        }
        let snapshot = self.snapshot.load_full();
        snapshot.head.serve(req, sink).await;
    }

    /// A point-in-time copy of the handler list, in invocation order.
    /// Subsequent appends do not alter a copy already handed out.
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.snapshot.load().handlers.clone()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline is itself a plain handler, so it can be mounted inside another
/// pipeline (the inner chain runs where the wrapper sits, then control
/// continues down the outer chain).
impl PlainHandler for Pipeline {
    fn handle<'a>(&'a self, req: &'a mut Request, sink: &'a mut ResponseSink) -> BoxFuture<'a> {
        Box::pin(self.dispatch(req, sink))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::Method;

    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<&'static str> {
        log.lock().unwrap().clone()
    }

    /// Records its name, then either continues or withholds the continuation.
    struct Record {
        name: &'static str,
        log: Log,
        proceed: bool,
    }

    impl Record {
        fn proceeding(name: &'static str, log: &Log) -> Self {
            Self { name, log: Arc::clone(log), proceed: true }
        }

        fn stopping(name: &'static str, log: &Log) -> Self {
            Self { name, log: Arc::clone(log), proceed: false }
        }
    }

    impl Handler for Record {
        fn serve<'a>(
            &'a self,
            req: &'a mut Request,
            sink: &'a mut ResponseSink,
            next: Next<'a>,
        ) -> BoxFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name);
                if self.proceed {
                    next.run(req, sink).await;
                }
            })
        }
    }

    /// Records its name and writes a body, ending the chain.
    struct Writes {
        name: &'static str,
        log: Log,
    }

    impl Handler for Writes {
        fn serve<'a>(
            &'a self,
            _req: &'a mut Request,
            sink: &'a mut ResponseSink,
            _next: Next<'a>,
        ) -> BoxFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name);
                sink.write(b"done");
            })
        }
    }

    struct PlainRecord {
        name: &'static str,
        log: Log,
    }

    impl PlainHandler for PlainRecord {
        fn handle<'a>(
            &'a self,
            _req: &'a mut Request,
            _sink: &'a mut ResponseSink,
        ) -> BoxFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name);
            })
        }
    }

    fn request() -> Request {
        Request::new(Method::GET, "/")
    }

    #[tokio::test]
    async fn dispatch_visits_handlers_in_order() {
        let log = log();
        let pipeline = Pipeline::new();
        pipeline.push(Record::proceeding("a", &log));
        pipeline.push(Record::proceeding("b", &log));
        pipeline.push(Record::proceeding("c", &log));

        pipeline.dispatch(&mut request(), &mut ResponseSink::new()).await;

        assert_eq!(entries(&log), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn withholding_the_continuation_short_circuits() {
        let log = log();
        let pipeline = Pipeline::new();
        pipeline.push(Record::proceeding("a", &log));
        pipeline.push(Record::stopping("b", &log));
        pipeline.push(Record::proceeding("c", &log));

        pipeline.dispatch(&mut request(), &mut ResponseSink::new()).await;

        assert_eq!(entries(&log), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn empty_pipeline_dispatch_is_a_no_op() {
        let pipeline = Pipeline::new();
        let mut sink = ResponseSink::new();
        pipeline.dispatch(&mut request(), &mut sink).await;
        assert!(!sink.written());
    }

    #[tokio::test]
    async fn second_dispatch_after_output_is_skipped() {
        let log = log();
        let pipeline = Pipeline::new();
        pipeline.push(Writes { name: "w", log: Arc::clone(&log) });

        let mut req = request();
        let mut sink = ResponseSink::new();
        pipeline.dispatch(&mut req, &mut sink).await;
        pipeline.dispatch(&mut req, &mut sink).await;

        assert_eq!(entries(&log), vec!["w"]);
    }

    #[tokio::test]
    async fn incremental_and_batch_builds_agree() {
        let log_a = log();
        let batch = Pipeline::from_handlers([
            Arc::new(Record::proceeding("1", &log_a)) as Arc<dyn Handler>,
            Arc::new(Record::proceeding("2", &log_a)) as Arc<dyn Handler>,
            Arc::new(Record::proceeding("3", &log_a)) as Arc<dyn Handler>,
        ]);

        let log_b = log();
        let incremental = Pipeline::new();
        incremental.push(Record::proceeding("1", &log_b));
        incremental.push(Record::proceeding("2", &log_b));
        incremental.push(Record::proceeding("3", &log_b));

        batch.dispatch(&mut request(), &mut ResponseSink::new()).await;
        incremental.dispatch(&mut request(), &mut ResponseSink::new()).await;

        assert_eq!(entries(&log_a), entries(&log_b));
    }

    #[tokio::test]
    async fn derived_pipeline_leaves_the_source_untouched() {
        let log = log();
        let source = Pipeline::new();
        source.push(Record::proceeding("a", &log));

        let derived = source.with([
            Arc::new(Record::proceeding("b", &log)) as Arc<dyn Handler>,
        ]);
        derived.push(Record::proceeding("c", &log));

        assert_eq!(source.handlers().len(), 1);
        assert_eq!(derived.handlers().len(), 3);

        source.dispatch(&mut request(), &mut ResponseSink::new()).await;
        assert_eq!(entries(&log), vec!["a"]);

        derived.dispatch(&mut request(), &mut ResponseSink::new()).await;
        assert_eq!(entries(&log), vec!["a", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn handler_list_copies_are_point_in_time() {
        let log = log();
        let pipeline = Pipeline::new();
        pipeline.push(Record::proceeding("a", &log));

        let before = pipeline.handlers();
        pipeline.push(Record::proceeding("b", &log));

        assert_eq!(before.len(), 1);
        assert_eq!(pipeline.handlers().len(), 2);
    }

    #[tokio::test]
    async fn plain_handlers_always_yield_to_the_next_node() {
        let log = log();
        let pipeline = Pipeline::new();
        pipeline.push_plain(PlainRecord { name: "plain", log: Arc::clone(&log) });
        pipeline.push(Record::proceeding("after", &log));

        pipeline.dispatch(&mut request(), &mut ResponseSink::new()).await;

        assert_eq!(entries(&log), vec!["plain", "after"]);
    }

    #[tokio::test]
    async fn a_pipeline_mounts_inside_another_pipeline() {
        let log = log();
        let inner = Pipeline::new();
        inner.push(Record::proceeding("inner", &log));

        let outer = Pipeline::new();
        outer.push(Record::proceeding("outer", &log));
        outer.push_plain(inner);
        outer.push(Record::proceeding("tail", &log));

        outer.dispatch(&mut request(), &mut ResponseSink::new()).await;

        assert_eq!(entries(&log), vec!["outer", "inner", "tail"]);
    }
}
