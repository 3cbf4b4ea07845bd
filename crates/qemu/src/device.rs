//! Devices placed in the guest topology and their QEMU argument form.
//!
//! A launch carries an ordered, heterogeneous list of [`Device`]s. Each
//! variant knows how to render itself into the `-device`, `-object` and
//! `-drive` arguments QEMU expects, so the launch boundary only needs an
//! exhaustive `match` instead of downcasting.

use std::path::PathBuf;

/// Bus name of the root complex on the legacy `pc` chipset.
pub const DEFAULT_PC_BRIDGE_BUS: &str = "pci.0";

/// Bus name of the root complex on the `q35` chipset.
pub const DEFAULT_BRIDGE_BUS: &str = "pcie.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    Bridge(BridgeDevice),
    Object(Object),
    Block(BlockDevice),
    Iommu(IommuDevice),
}

impl Device {
    pub fn qemu_params(&self) -> Vec<String> {
        match self {
            Self::Bridge(d) => d.qemu_params(),
            Self::Object(d) => d.qemu_params(),
            Self::Block(d) => d.qemu_params(),
            Self::Iommu(d) => d.qemu_params(),
        }
    }
}

impl From<BridgeDevice> for Device {
    fn from(d: BridgeDevice) -> Self {
        Self::Bridge(d)
    }
}

impl From<Object> for Device {
    fn from(d: Object) -> Self {
        Self::Object(d)
    }
}

impl From<BlockDevice> for Device {
    fn from(d: BlockDevice) -> Self {
        Self::Block(d)
    }
}

impl From<IommuDevice> for Device {
    fn from(d: IommuDevice) -> Self {
        Self::Iommu(d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeKind {
    PciBridge,
}

impl BridgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PciBridge => "pci-bridge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeDevice {
    pub kind: BridgeKind,
    /// Bus the bridge is plugged into.
    pub bus: String,
    pub id: String,
    /// Chassis number, unique and greater than zero.
    pub chassis: u32,
    /// Standard hot-plug controller.
    pub shpc: bool,
    /// Address on the parent bus.
    pub addr: String,
}

impl BridgeDevice {
    fn qemu_params(&self) -> Vec<String> {
        let shpc = if self.shpc { "on" } else { "off" };
        let mut device = format!(
            "{},bus={},id={},chassis_nr={},shpc={}",
            self.kind.as_str(),
            self.bus,
            self.id,
            self.chassis,
            shpc
        );
        if !self.addr.is_empty() {
            device.push_str(&format!(",addr={}", self.addr));
        }
        vec!["-device".to_string(), device]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectDriver {
    Nvdimm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    MemoryBackendFile,
}

/// A memory backend paired with the device that exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub driver: ObjectDriver,
    pub object_type: ObjectType,
    pub device_id: String,
    pub id: String,
    pub mem_path: PathBuf,
    /// Backend size in bytes.
    pub size: u64,
}

impl Object {
    fn qemu_params(&self) -> Vec<String> {
        let device = match self.driver {
            ObjectDriver::Nvdimm => format!("nvdimm,id={},memdev={}", self.device_id, self.id),
        };
        let object = match self.object_type {
            ObjectType::MemoryBackendFile => format!(
                "memory-backend-file,id={},mem-path={},size={}",
                self.id,
                self.mem_path.display(),
                self.size
            ),
        };
        vec![
            "-device".to_string(),
            device,
            "-object".to_string(),
            object,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDriver {
    VirtioBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAio {
    Threads,
}

impl BlockAio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threads => "threads",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub driver: BlockDriver,
    pub id: String,
    pub file: PathBuf,
    pub aio: BlockAio,
    pub format: String,
    pub interface: String,
    /// Lets several VMs open the same backing file.
    pub share_rw: bool,
}

impl BlockDevice {
    fn qemu_params(&self) -> Vec<String> {
        let mut device = match self.driver {
            BlockDriver::VirtioBlock => format!("virtio-blk-pci,drive={}", self.id),
        };
        if self.share_rw {
            device.push_str(",share-rw=on");
        }
        let drive = format!(
            "id={},file={},aio={},format={},if={}",
            self.id,
            self.file.display(),
            self.aio.as_str(),
            self.format,
            self.interface
        );
        vec![
            "-device".to_string(),
            device,
            "-drive".to_string(),
            drive,
        ]
    }
}

/// A disk to attach through [`QemuArch::append_block_device`](crate::QemuArch::append_block_device).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDrive {
    pub id: String,
    pub file: PathBuf,
    pub share_rw: bool,
}

/// Intel vIOMMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IommuDevice {
    pub intremap: bool,
    pub device_iotlb: bool,
    pub caching_mode: bool,
}

impl IommuDevice {
    fn qemu_params(&self) -> Vec<String> {
        let on_off = |b: bool| if b { "on" } else { "off" };
        vec![
            "-device".to_string(),
            format!(
                "intel-iommu,intremap={},device-iotlb={},caching-mode={}",
                on_off(self.intremap),
                on_off(self.device_iotlb),
                on_off(self.caching_mode)
            ),
        ]
    }
}

/// Memory layout of the guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    pub size: String,
    pub slots: u8,
    pub max_mem: String,
}

impl Memory {
    /// Memory without hotplug headroom.
    pub fn fixed(size_mb: u64) -> Self {
        Self {
            size: format!("{size_mb}M"),
            slots: 0,
            max_mem: String::new(),
        }
    }

    pub fn qemu_params(&self) -> Vec<String> {
        let mut value = self.size.clone();
        if self.slots > 0 {
            value.push_str(&format!(",slots={}", self.slots));
        }
        if !self.max_mem.is_empty() {
            value.push_str(&format!(",maxmem={}", self.max_mem));
        }
        vec!["-m".to_string(), value]
    }
}

/// Machine type and its accelerator options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub machine_type: String,
    pub options: String,
}

impl Machine {
    pub fn new(machine_type: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            machine_type: machine_type.into(),
            options: options.into(),
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.split(',').any(|o| o == option)
    }

    pub fn qemu_params(&self) -> Vec<String> {
        let mut value = self.machine_type.clone();
        if !self.options.is_empty() {
            value.push(',');
            value.push_str(&self.options);
        }
        vec!["-machine".to_string(), value]
    }
}
