/// Staticd Daemon: static-site serving over an acquired listener
/// Provides configuration, the response-header surface, request-path
/// resolution, and the hyper serving loop.
pub mod config;
pub mod errors;
pub mod files;
pub mod headers;
pub mod server;

// Re-export commonly used types
pub use config::{DaemonConfig, LoggingConfig, RecoveryConfig, ServerConfig};
pub use errors::{DaemonError, DaemonResult};
pub use headers::{default_headers, HeaderEntry, ResponseHeaders};
pub use server::{RequestCounters, StaticServer};

/// Daemon version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
