//! Static file serving middleware.

use std::path::{Path, PathBuf};

use http::{Method, StatusCode};

use crate::chain::Next;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::sink::ResponseSink;

/// Serves files under a root directory for `GET` and `HEAD` requests.
///
/// On a hit it writes the file and ends the chain. Everything else — other
/// methods, traversal attempts, missing files — falls through to the
/// continuation without touching the sink, so the rest of the pipeline gets
/// its turn.
///
/// Directory requests fall back to the directory's `index.html`.
pub struct Static {
    root: PathBuf,
}

impl Static {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Handler for Static {
    fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            let head = req.method() == &Method::HEAD;
            if !head && req.method() != &Method::GET {
                return next.run(req, sink).await;
            }

            let rel = req.path().trim_start_matches('/');
            // Dot-dot segments would escape the root.
            if rel.split('/').any(|segment| segment == "..") {
                return next.run(req, sink).await;
            }

            let mut path = self.root.join(rel);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => path.push("index.html"),
                Ok(_) => {}
                Err(_) => return next.run(req, sink).await,
            }

            let body = match tokio::fs::read(&path).await {
                Ok(body) => body,
                Err(_) => return next.run(req, sink).await,
            };

            sink.header("content-type", content_type_for(&path));
            sink.set_status(StatusCode::OK);
            if !head {
                sink.write(&body);
            }
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("ico") => "image/x-icon",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
