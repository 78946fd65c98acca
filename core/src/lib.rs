/// Staticd Core: listener acquisition over an ordered port candidate list
/// Provides the endpoint types, availability probe, bind scan, and the
/// opt-in port-holder eviction escalation.
pub mod acquire;
pub mod endpoint;
pub mod errors;
#[cfg(unix)]
pub mod evict;
pub mod probe;

// Re-export commonly used types
pub use acquire::{Bind, BoundListener, ListenerFactory, SocketBinder};
pub use endpoint::{
    parse_preferred_port, preferred_port_from_env, Endpoint, PortList, COMMON_FALLBACKS,
    DEFAULT_PORT, PORT_ENV_VAR,
};
pub use errors::{AcquireError, AcquireResult};
pub use probe::{probe, ProbeStatus};

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
