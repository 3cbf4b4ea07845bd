// TODO: the boolean fields could become a bitflags set once more
// capabilities than the machine catalog needs show up

/// Capabilities of a configured VM, derived from its machine type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Block devices can be attached at boot.
    pub block_device: bool,
    /// Block devices can be hot plugged into a running guest.
    pub block_device_hotplug: bool,
    /// Network devices can use multiple queues.
    pub multi_queue: bool,
    /// Host directories can be shared with the guest.
    pub fs_sharing: bool,
    /// Guest memory can be hot plugged.
    pub memory_hotplug: bool,
    /// PCI bridges can be placed on the root bus.
    pub bridges: bool,
}

impl Capabilities {
    pub fn is_block_device_supported(&self) -> bool {
        self.block_device
    }

    pub fn is_block_device_hotplug_supported(&self) -> bool {
        self.block_device_hotplug
    }

    pub fn is_multi_queue_supported(&self) -> bool {
        self.multi_queue
    }

    pub fn is_fs_sharing_supported(&self) -> bool {
        self.fs_sharing
    }

    pub fn is_memory_hotplug_supported(&self) -> bool {
        self.memory_hotplug
    }

    pub fn is_bridging_supported(&self) -> bool {
        self.bridges
    }
}
