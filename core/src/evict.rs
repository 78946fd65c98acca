/// Opt-in recovery: terminate whatever is listening on a port.
///
/// There is no reliable way to prove the occupying process is a previous
/// instance of this server, so this module is never invoked by default.
/// It signals with SIGTERM only, never SIGKILL, and logs every PID it
/// touches.
use crate::errors::{AcquireError, AcquireResult};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::Command;
use tracing::warn;

/// Send SIGTERM to every process listening on `port`, skipping the
/// current process. Returns the PIDs that were signaled.
pub fn evict_port_holder(port: u16) -> AcquireResult<Vec<i32>> {
    let output = Command::new("lsof")
        .args(["-t", "-i", &format!(":{}", port), "-sTCP:LISTEN"])
        .output()
        .map_err(|e| AcquireError::EvictionError(format!("failed to run lsof: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let own_pid = std::process::id() as i32;
    let mut signaled = Vec::new();

    for line in stdout.lines() {
        let pid: i32 = match line.trim().parse() {
            Ok(pid) => pid,
            Err(_) => continue,
        };
        if pid == own_pid {
            continue;
        }

        warn!(pid, port, "sending SIGTERM to process holding port");
        kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(|e| {
            AcquireError::EvictionError(format!("SIGTERM to pid {} failed: {}", pid, e))
        })?;
        signaled.push(pid);
    }

    Ok(signaled)
}
