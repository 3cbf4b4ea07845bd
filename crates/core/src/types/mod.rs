mod bridge;

pub use bridge::{BRIDGE_PCI_START_ADDR, Bridge, BridgeType, PCI_BRIDGE_MAX_CAPACITY};
