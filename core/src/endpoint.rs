/// Endpoint and port-candidate types for listener acquisition.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Preferred port when the environment supplies nothing usable
pub const DEFAULT_PORT: u16 = 5000;

/// Environment variable carrying the preferred port
pub const PORT_ENV_VAR: &str = "PORT";

/// Well-known alternates appended after the preferred port's neighbors
pub const COMMON_FALLBACKS: [u16; 3] = [8000, 8080, 3000];

/// A (bind address, port) pair identifying where a listener attaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub addr: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(addr: IpAddr, port: u16) -> Self {
        Endpoint { addr, port }
    }

    /// All-interfaces endpoint, the default for every observed deployment
    pub fn wildcard(port: u16) -> Self {
        Endpoint::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(e: Endpoint) -> SocketAddr {
        e.socket_addr()
    }
}

/// Ordered candidate ports: preferred first, fallbacks after. First
/// bindable port wins; the order is never changed after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortList(Vec<u16>);

impl PortList {
    /// A list holding exactly the given ports, deduplicated in order.
    /// Falls back to the default port if `ports` is empty.
    pub fn new(ports: Vec<u16>) -> Self {
        let mut seen = Vec::new();
        for port in ports {
            if !seen.contains(&port) {
                seen.push(port);
            }
        }
        if seen.is_empty() {
            seen.push(DEFAULT_PORT);
        }
        PortList(seen)
    }

    pub fn single(port: u16) -> Self {
        PortList(vec![port])
    }

    /// The conventional scan: preferred, its two successors, then the
    /// given extra fallbacks, deduplicated preserving order.
    pub fn with_neighbors(preferred: u16, extra: &[u16]) -> Self {
        let mut ports = vec![preferred];
        for offset in 1..=2u16 {
            if let Some(p) = preferred.checked_add(offset) {
                ports.push(p);
            }
        }
        ports.extend_from_slice(extra);
        PortList::new(ports)
    }

    pub fn preferred(&self) -> u16 {
        self.0[0]
    }

    pub fn ports(&self) -> &[u16] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }

    /// Candidate count; construction guarantees at least one
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parse a string-encoded port, falling back to the default when the
/// value is absent or unparsable.
pub fn parse_preferred_port(raw: Option<&str>) -> u16 {
    raw.and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Preferred port from the `PORT` environment variable
pub fn preferred_port_from_env() -> u16 {
    parse_preferred_port(std::env::var(PORT_ENV_VAR).ok().as_deref())
}
