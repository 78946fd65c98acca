/// Listener acquisition: sequential bind over an ordered candidate list.
///
/// The scan always performs a real bind-and-listen per candidate rather
/// than probe-then-bind, so there is no window between checking a port
/// and taking it. Address-in-use advances to the next candidate; any
/// other failure aborts the whole scan.
use crate::endpoint::{Endpoint, PortList};
use crate::errors::{AcquireError, AcquireResult};
use std::io;
use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Seam between the scan logic and the kernel socket call
pub trait Bind {
    fn bind(&mut self, endpoint: Endpoint) -> io::Result<TcpListener>;
}

/// The real bind-and-listen system call
#[derive(Debug, Default)]
pub struct SocketBinder;

impl Bind for SocketBinder {
    fn bind(&mut self, endpoint: Endpoint) -> io::Result<TcpListener> {
        TcpListener::bind(endpoint.socket_addr())
    }
}

/// A successful acquisition: the live listener, where it landed, and the
/// candidates that were skipped on the way there.
#[derive(Debug)]
pub struct BoundListener {
    pub listener: TcpListener,
    pub endpoint: Endpoint,
    pub skipped: Vec<u16>,
}

/// Produces one bound, listening socket from an ordered candidate list.
///
/// Acquisition is synchronous and single-threaded: the kernel port table
/// is a shared resource and concurrent probes would race on the same
/// address-in-use error the scan exists to handle. There is no sleep or
/// backoff between candidates; a delayed retry of the whole list is the
/// caller's decision, bounded, never an internal loop.
#[derive(Debug, Clone)]
pub struct ListenerFactory {
    addr: IpAddr,
    ports: PortList,
    evict_holder: bool,
}

impl ListenerFactory {
    pub fn new(addr: IpAddr, ports: PortList) -> Self {
        ListenerFactory {
            addr,
            ports,
            evict_holder: false,
        }
    }

    /// All-interfaces factory, the default deployment shape
    pub fn wildcard(ports: PortList) -> Self {
        ListenerFactory::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), ports)
    }

    /// Opt in to terminating whatever holds the preferred port before
    /// giving up on it. Destructive; off by default. Applies only to the
    /// first candidate and only sends SIGTERM.
    pub fn with_eviction(mut self, enabled: bool) -> Self {
        self.evict_holder = enabled;
        self
    }

    pub fn ports(&self) -> &PortList {
        &self.ports
    }

    /// Acquire a listener with the real socket binder.
    pub fn acquire(&self) -> AcquireResult<BoundListener> {
        self.acquire_with(&mut SocketBinder)
    }

    /// One scan, plus at most one delayed whole-list retry when the
    /// caller supplies a bound. Only exhaustion is retried; a fatal
    /// error surfaces immediately, and there is never a second retry.
    pub fn acquire_with_retry(&self, retry_after: Option<Duration>) -> AcquireResult<BoundListener> {
        self.acquire_with_retry_using(&mut SocketBinder, retry_after)
    }

    pub fn acquire_with_retry_using<B: Bind>(
        &self,
        binder: &mut B,
        retry_after: Option<Duration>,
    ) -> AcquireResult<BoundListener> {
        match self.acquire_with(binder) {
            Err(e @ AcquireError::Exhausted { .. }) => match retry_after {
                Some(delay) => {
                    warn!("all candidates occupied, retrying once in {:?}: {}", delay, e);
                    std::thread::sleep(delay);
                    self.acquire_with(binder)
                }
                None => Err(e),
            },
            outcome => outcome,
        }
    }

    /// Acquire a listener through an injected binder. Candidates are
    /// tried strictly in list order; the first success wins.
    pub fn acquire_with<B: Bind>(&self, binder: &mut B) -> AcquireResult<BoundListener> {
        let mut skipped = Vec::new();

        for (index, port) in self.ports.iter().enumerate() {
            let endpoint = Endpoint::new(self.addr, port);
            debug!(candidate = index, %endpoint, "attempting bind");

            match binder.bind(endpoint) {
                Ok(listener) => return Ok(self.bound(listener, endpoint, skipped)),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    if index == 0 && self.evict_holder {
                        if let Some(bound) = self.try_evict_and_rebind(binder, endpoint)? {
                            return Ok(bound);
                        }
                    }
                    warn!(%endpoint, "port in use, trying next candidate");
                    skipped.push(port);
                }
                Err(e) => return Err(AcquireError::from_bind(endpoint, e)),
            }
        }

        Err(AcquireError::Exhausted {
            attempted: self.ports.ports().to_vec(),
        })
    }

    fn bound(
        &self,
        listener: TcpListener,
        requested: Endpoint,
        skipped: Vec<u16>,
    ) -> BoundListener {
        // Port 0 asks the kernel to pick; report what it chose
        let endpoint = if requested.port == 0 {
            match listener.local_addr() {
                Ok(local) => Endpoint::new(requested.addr, local.port()),
                Err(_) => requested,
            }
        } else {
            requested
        };

        info!(%endpoint, skipped = skipped.len(), "listener bound");
        BoundListener {
            listener,
            endpoint,
            skipped,
        }
    }

    /// Escalation path for an occupied preferred port: SIGTERM the
    /// holder, wait briefly for the port to come free, re-attempt once.
    /// Failure here is not fatal to the scan; the fallback order still
    /// applies.
    #[cfg(unix)]
    fn try_evict_and_rebind<B: Bind>(
        &self,
        binder: &mut B,
        endpoint: Endpoint,
    ) -> AcquireResult<Option<BoundListener>> {
        warn!(%endpoint, "preferred port occupied, eviction enabled");
        let signaled = match crate::evict::evict_port_holder(endpoint.port) {
            Ok(pids) => pids,
            Err(e) => {
                warn!(%endpoint, error = %e, "eviction failed, falling back");
                return Ok(None);
            }
        };
        if signaled.is_empty() {
            return Ok(None);
        }

        // Bounded wait for the old holder to release the port
        for _ in 0..20 {
            if crate::probe::probe(endpoint).is_available() {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        match binder.bind(endpoint) {
            Ok(listener) => Ok(Some(self.bound(listener, endpoint, Vec::new()))),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!(%endpoint, "port still held after eviction, falling back");
                Ok(None)
            }
            Err(e) => Err(AcquireError::from_bind(endpoint, e)),
        }
    }

    #[cfg(not(unix))]
    fn try_evict_and_rebind<B: Bind>(
        &self,
        _binder: &mut B,
        endpoint: Endpoint,
    ) -> AcquireResult<Option<BoundListener>> {
        warn!(%endpoint, "eviction requested but unsupported on this platform");
        Ok(None)
    }
}
