//! Response sink — the response under construction, plus one bit of state.
//!
//! [`ResponseSink`] wraps a buffered [`Response`] and records whether any
//! output has been produced yet. The first body write or status set flips the
//! `written` flag; setting a header does not. The flag never flips back for
//! the lifetime of the exchange.
//!
//! The pipeline reads the flag before dispatching: an exchange that already
//! produced output is not dispatched again. Handlers can read it too, e.g. a
//! recovery component deciding whether a clean error page is still possible.

use http::StatusCode;

use crate::response::Response;

/// Wraps the outgoing [`Response`] with written-state tracking.
///
/// Created once per incoming request by the server layer (or by hand in
/// tests and embeddings) and discarded after the exchange completes.
pub struct ResponseSink {
    response: Response,
    written: bool,
}

impl ResponseSink {
    /// An empty sink: `200 OK`, no headers, no body, nothing written yet.
    pub fn new() -> Self {
        Self::wrap(Response::status(StatusCode::OK))
    }

    /// Wraps a pre-populated response, e.g. one carrying server-wide headers.
    /// The sink starts unwritten regardless of the response's contents.
    pub fn wrap(response: Response) -> Self {
        Self { response, written: false }
    }

    /// Whether any status or body output has occurred on this exchange.
    pub fn written(&self) -> bool {
        self.written
    }

    /// Sets the response status. Marks the sink written.
    pub fn set_status(&mut self, status: StatusCode) {
        self.written = true;
        self.response.set_status(status);
    }

    /// Appends a header. Does *not* mark the sink written — headers may be
    /// staged freely before a handler commits to producing output.
    pub fn header(&mut self, name: &str, value: &str) {
        self.response.push_header(name, value);
    }

    /// Appends bytes to the response body. Marks the sink written.
    pub fn write(&mut self, chunk: &[u8]) {
        self.written = true;
        self.response.extend_body(chunk);
    }

    /// Replaces the buffered response wholesale. Marks the sink written.
    ///
    /// Because the response is buffered rather than streamed, a handler may
    /// discard partial downstream output this way — recovery middleware uses
    /// it to swap a half-built page for a clean 500.
    pub fn respond(&mut self, response: Response) {
        self.written = true;
        self.response = response;
    }

    /// Current response status.
    pub fn status(&self) -> StatusCode {
        self.response.status_code()
    }

    /// Current body size in bytes.
    pub fn size(&self) -> usize {
        self.response.body().len()
    }

    /// Unwraps the finished response for the transport layer.
    pub fn into_inner(self) -> Response {
        self.response
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unwritten() {
        assert!(!ResponseSink::new().written());
    }

    #[test]
    fn body_write_flips_the_flag() {
        let mut sink = ResponseSink::new();
        sink.write(b"hello");
        assert!(sink.written());
        assert_eq!(sink.size(), 5);
    }

    #[test]
    fn status_set_flips_the_flag() {
        let mut sink = ResponseSink::new();
        sink.set_status(StatusCode::NO_CONTENT);
        assert!(sink.written());
        assert_eq!(sink.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn headers_do_not_flip_the_flag() {
        let mut sink = ResponseSink::new();
        sink.header("x-request-id", "abc");
        assert!(!sink.written());
    }

    #[test]
    fn respond_replaces_the_buffered_response() {
        let mut sink = ResponseSink::new();
        sink.write(b"partial");
        sink.respond(Response::status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(sink.written());
        assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(sink.size(), 0);
    }
}
