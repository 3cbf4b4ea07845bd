use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of device slots on a PCI bridge.
pub const PCI_BRIDGE_MAX_CAPACITY: u32 = 30;

/// Guest PCI address of the first bridge on the root bus.
pub const BRIDGE_PCI_START_ADDR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeType {
    Pci,
}

impl fmt::Display for BridgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pci => f.write_str("pci"),
        }
    }
}

/// A bridge in the guest topology and the devices placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub id: String,
    pub bridge_type: BridgeType,
    /// Guest PCI address of the bridge itself.
    pub addr: u32,
    /// Slot on the bridge to device id.
    pub devices: BTreeMap<u32, String>,
}

impl Bridge {
    /// Creates the bridge at position `index` of a registry.
    pub fn new(bridge_type: BridgeType, index: u32) -> Self {
        Self {
            id: format!("{bridge_type}-bridge-{index}"),
            bridge_type,
            addr: BRIDGE_PCI_START_ADDR + index,
            devices: BTreeMap::new(),
        }
    }

    /// Places a device on the first free slot and returns that slot.
    pub fn add_device(&mut self, id: impl Into<String>) -> Result<u32> {
        let slot = (1..=PCI_BRIDGE_MAX_CAPACITY)
            .find(|slot| !self.devices.contains_key(slot))
            .ok_or_else(|| Error::BridgeFull {
                bridge: self.id.clone(),
            })?;
        self.devices.insert(slot, id.into());
        Ok(slot)
    }

    pub fn remove_device(&mut self, id: &str) -> Result<()> {
        let slot = self
            .devices
            .iter()
            .find_map(|(slot, dev)| (dev == id).then_some(*slot))
            .ok_or_else(|| Error::DeviceNotOnBridge {
                bridge: self.id.clone(),
                device: id.to_string(),
            })?;
        self.devices.remove(&slot);
        Ok(())
    }
}
