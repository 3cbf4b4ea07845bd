//! Host-side health probes for a running sandbox.

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;
use sandvm_core::{AgentProbe, Error, HypervisorProbe, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::time::timeout;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Checks that the hypervisor process still exists.
#[derive(Debug, Clone, Copy)]
pub struct ProcessHypervisor {
    pid: Pid,
}

impl ProcessHypervisor {
    /// Fails for pids below 1, which `kill` treats as process groups.
    pub fn new(pid: i32) -> Result<Self> {
        if pid <= 0 {
            return Err(Error::InvalidConfig(format!(
                "hypervisor pid must be positive, got {pid}"
            )));
        }
        Ok(Self {
            pid: Pid::from_raw(pid),
        })
    }

    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }
}

#[async_trait]
impl HypervisorProbe for ProcessHypervisor {
    async fn check(&self) -> Result<()> {
        match signal::kill(self.pid, None) {
            // EPERM: the process exists but belongs to someone else.
            Ok(()) | Err(Errno::EPERM) => Ok(()),
            Err(e) => Err(Error::Hypervisor(format!(
                "process {} is not running: {e}",
                self.pid
            ))),
        }
    }
}

/// Checks that the guest agent accepts connections on its host socket.
///
/// Once marked dead, every later check fails without touching the socket.
#[derive(Debug)]
pub struct SocketAgent {
    path: PathBuf,
    connect_timeout: Duration,
    dead: AtomicBool,
}

impl SocketAgent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            dead: AtomicBool::new(false),
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentProbe for SocketAgent {
    async fn check(&self) -> Result<()> {
        if self.is_dead() {
            return Err(Error::Agent("dead agent".to_string()));
        }

        match timeout(self.connect_timeout, UnixStream::connect(&self.path)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(Error::Agent(format!(
                "failed to connect to {}: {e}",
                self.path.display()
            ))),
            Err(_) => Err(Error::Agent(format!(
                "connecting to {} timed out after {:?}",
                self.path.display(),
                self.connect_timeout
            ))),
        }
    }

    fn mark_dead(&self) {
        if !self.dead.swap(true, Ordering::SeqCst) {
            tracing::warn!(socket = %self.path.display(), "agent marked dead");
        }
    }
}
