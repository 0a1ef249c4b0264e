//! HTTP server and graceful shutdown.
//!
//! This is the transport shell around the pipeline. Per exchange it buffers
//! the request body, builds a [`Request`], creates a fresh [`ResponseSink`],
//! dispatches into the pipeline, and ships whatever the sink holds when the
//! chain unwinds — an untouched sink ships as an empty `200 OK`.
//!
//! On SIGTERM or Ctrl-C the server stops accepting immediately and drains
//! every in-flight connection before returning, so `kubectl delete pod` (or
//! a plain Ctrl-C in development) never cuts a response off mid-body.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;
use crate::sink::ResponseSink;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind `addr` when [`serve`](Server::serve) is
    /// called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string — a misconfigured
    /// address is a deployment bug worth failing loudly on at startup.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Binds the address a [`Config`] resolved.
    pub fn from_config(config: &Config) -> Self {
        Self::bind(&config.addr)
    }

    /// Accepts connections and dispatches every request through `pipeline`.
    ///
    /// Returns after a full graceful shutdown: a termination signal followed
    /// by all in-flight connections completing.
    pub async fn serve(self, pipeline: Pipeline) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared across connection tasks; each request runs against the
        // pipeline snapshot it loads at dispatch entry.
        let pipeline = Arc::new(pipeline);

        info!(addr = %self.addr, "relay listening");

        // Every connection task lands in the JoinSet so shutdown can wait
        // for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check the shutdown arm first so a signal stops the accept
                // loop even when connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let pipeline = Arc::clone(&pipeline);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // One service per connection; the closure runs once
                        // per request on that connection.
                        let svc = service_fn(move |req| {
                            let pipeline = Arc::clone(&pipeline);
                            async move { exchange(pipeline, req).await }
                        });

                        // auto::Builder speaks HTTP/1.1 or HTTP/2, whichever
                        // the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set stays bounded on
                // long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("relay stopped");
        Ok(())
    }
}

// ── One exchange ──────────────────────────────────────────────────────────────

/// Runs a single request through the pipeline.
///
/// The error type is `Infallible`: every failure becomes a response, so
/// hyper never sees an error from us.
async fn exchange(
    pipeline: Arc<Pipeline>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            error!("failed to read request body: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_http());
        }
    };

    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let mut request = Request::from_parts(
        parts.method,
        parts.uri.path().to_owned(),
        parts.uri.query().map(str::to_owned),
        headers,
        body,
    );

    let mut sink = ResponseSink::new();
    pipeline.dispatch(&mut request, &mut sink).await;

    Ok(sink.into_inner().into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first termination signal: SIGTERM or SIGINT on Unix,
/// Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
