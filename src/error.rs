//! Unified error type.

use std::fmt;

/// The error type returned by relay's fallible operations.
///
/// Handlers never return errors to the pipeline — failure policy lives in
/// middleware (see [`Recovery`](crate::middleware::Recovery)). This type
/// covers infrastructure failures only: binding the listen socket, accepting
/// a connection.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}
