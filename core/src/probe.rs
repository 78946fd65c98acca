/// Side-effect-free availability check for a single endpoint.
use crate::endpoint::Endpoint;
use std::io;
use std::net::TcpListener;

/// Outcome of probing one endpoint
#[derive(Debug)]
pub enum ProbeStatus {
    /// The port could be bound; the probe socket has been released
    Available,
    /// Another socket holds the port
    InUse,
    /// A failure no other port will fix; must not be retried
    Fatal(io::Error),
}

impl ProbeStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeStatus::Available)
    }
}

/// Bind a throwaway listening socket on the endpoint and classify the
/// result. The socket is dropped immediately on success so the real
/// listener can re-bind. Safe to call repeatedly; no persistent state.
pub fn probe(endpoint: Endpoint) -> ProbeStatus {
    match TcpListener::bind(endpoint.socket_addr()) {
        Ok(listener) => {
            drop(listener);
            ProbeStatus::Available
        }
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => ProbeStatus::InUse,
        Err(e) => ProbeStatus::Fatal(e),
    }
}
