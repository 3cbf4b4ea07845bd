pub mod backend;
pub mod capabilities;
pub mod error;
pub mod params;
pub mod types;

pub use backend::{AgentProbe, HypervisorProbe};
pub use capabilities::Capabilities;
pub use error::{Error, HealthCheck, Result};
pub use params::{KernelParams, Param};
pub use types::{BRIDGE_PCI_START_ADDR, Bridge, BridgeType, PCI_BRIDGE_MAX_CAPACITY};
