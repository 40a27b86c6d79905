use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default cap on prediction request bodies.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Endpoint settings.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Artifact loaded at startup and on reload.
    pub model_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    /// Larger prediction bodies are rejected with 413.
    pub max_body_bytes: u64,
}

impl ServeConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
