//! Classic pipeline — recovery, request logging, static files, then the app.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/
//!   curl http://localhost:8080/users/42        # any path works; no router here
//!   curl -X POST http://localhost:8080/users -d '{"name":"alice"}'
//!   PORT=3000 cargo run --example basic        # address from the environment

use relay::{
    BoxFuture, Config, Pipeline, PlainHandler, Request, Response, ResponseSink, Server,
    StatusCode,
};

/// The application sits at the end of the chain as a plain handler: it never
/// sees the continuation, and the pipeline continues past it automatically.
struct App;

impl PlainHandler for App {
    fn handle<'a>(&'a self, req: &'a mut Request, sink: &'a mut ResponseSink) -> BoxFuture<'a> {
        Box::pin(async move {
            match req.path() {
                "/" => sink.respond(Response::text("hello from relay")),
                "/users" if !req.body().is_empty() => sink.respond(
                    Response::builder()
                        .status(StatusCode::CREATED)
                        .header("location", "/users/99")
                        .json(br#"{"id":"99"}"#.to_vec()),
                ),
                _ => sink.respond(Response::status(StatusCode::NOT_FOUND)),
            }
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Recovery first, logging second, static files out of ./public, app last.
    let app = Pipeline::classic();
    app.push_plain(App);

    Server::from_config(&Config::resolve(None))
        .serve(app)
        .await
        .expect("server error");
}
