//! Listen-address resolution.
//!
//! Resolved once at startup and passed around as a value — nothing in the
//! crate reads the environment lazily.

/// Address used when neither an explicit argument nor `PORT` is given.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";

/// Startup configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// `host:port` the server binds to.
    pub addr: String,
}

impl Config {
    /// Resolves the listen address: explicit argument, then the `PORT`
    /// environment variable (bound on all interfaces), then
    /// [`DEFAULT_ADDRESS`].
    pub fn resolve(addr: Option<&str>) -> Self {
        Self::resolve_from(addr, std::env::var("PORT").ok())
    }

    fn resolve_from(addr: Option<&str>, port: Option<String>) -> Self {
        let addr = match (addr, port) {
            (Some(explicit), _) => explicit.to_owned(),
            (None, Some(port)) if !port.is_empty() => format!("0.0.0.0:{port}"),
            _ => DEFAULT_ADDRESS.to_owned(),
        };
        Self { addr }
    }
}
