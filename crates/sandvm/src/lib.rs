//! Runtime pieces that keep a VM-backed container sandbox operable.
//!
//! - [`Monitor`] watches the hypervisor process and the guest agent and
//!   broadcasts failures to subscribers.
//! - [`qemu`] shapes the VM itself: machine type, PCI bridges, CPU model,
//!   memory layout and image devices.
//!
//! # Example
//!
//! ```rust,no_run
//! use sandvm::{Monitor, ProcessHypervisor, SocketAgent};
//! use std::sync::Arc;
//!
//! # async fn example() -> sandvm::Result<()> {
//! let monitor = Monitor::new(
//!     Arc::new(ProcessHypervisor::new(4242)?),
//!     Arc::new(SocketAgent::new("/run/sandvm/agent.sock")),
//! );
//!
//! let mut watcher = monitor.new_watcher()?;
//! if let Some(err) = watcher.recv().await {
//!     eprintln!("sandbox unhealthy: {err}");
//! }
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

mod monitor;
#[cfg(unix)]
mod probe;

pub use monitor::{DEFAULT_CHECK_INTERVAL, Monitor, WATCHER_CHANNEL_SIZE, Watcher};
#[cfg(unix)]
pub use probe::{ProcessHypervisor, SocketAgent};

pub use sandvm_core::{
    AgentProbe, Bridge, BridgeType, Capabilities, Error, HealthCheck, HypervisorProbe,
    KernelParams, Param, Result,
};

/// VM topology for the QEMU hypervisor.
pub mod qemu {
    pub use sandvm_qemu::*;
}
