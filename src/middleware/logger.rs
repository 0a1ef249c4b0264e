//! Request logging middleware.

use std::time::Instant;

use tracing::info;

use crate::chain::Next;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::sink::ResponseSink;

/// Emits one structured log line per request: method, path, response status,
/// body size, and latency measured around the rest of the chain.
///
/// Mount it after [`Recovery`](crate::middleware::Recovery) so recovered
/// panics still get logged as the `500`s they became.
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Logger {
    fn serve<'a>(
        &'a self,
        req: &'a mut Request,
        sink: &'a mut ResponseSink,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let path = req.path().to_owned();

            next.run(&mut *req, &mut *sink).await;

            info!(
                %method,
                path = %path,
                status = sink.status().as_u16(),
                bytes = sink.size(),
                elapsed = ?start.elapsed(),
                "request handled"
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::response::Response;
    use http::{Method, StatusCode};

    struct Teapot;

    impl Handler for Teapot {
        fn serve<'a>(
            &'a self,
            _req: &'a mut Request,
            sink: &'a mut ResponseSink,
            _next: Next<'a>,
        ) -> BoxFuture<'a> {
            Box::pin(async move {
                sink.respond(Response::status(StatusCode::IM_A_TEAPOT));
            })
        }
    }

    #[tokio::test]
    async fn logger_forwards_to_the_rest_of_the_chain() {
        let pipeline = Pipeline::new();
        pipeline.push(Logger::new());
        pipeline.push(Teapot);

        let mut req = Request::new(Method::GET, "/brew");
        let mut sink = ResponseSink::new();
        pipeline.dispatch(&mut req, &mut sink).await;

        assert_eq!(sink.status(), StatusCode::IM_A_TEAPOT);
    }
}
