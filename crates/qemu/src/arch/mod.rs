mod amd64;

pub use amd64::{DEFAULT_CPU_MODEL, DEFAULT_QEMU_PATH, MAX_QEMU_VCPUS, MEMORY_OFFSET_MB, QemuAmd64};

use crate::config::HypervisorConfig;
use crate::device::{BlockDrive, Device, Machine, Memory};
use crate::machine::MachineType;
use sandvm_core::{Bridge, Capabilities, KernelParams, Result};
use std::path::{Path, PathBuf};

/// Architecture-specific rules for shaping a QEMU VM.
///
/// VM assembly code talks to this trait only; which buses exist, which
/// devices are legal and how the CPU is modelled are decided by the
/// implementation for the configured machine type.
pub trait QemuArch: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Replaces the bridge registry with `count` fresh bridges. Machine
    /// types without bridging leave the registry empty.
    fn bridges(&mut self, count: u32);

    fn get_bridges(&self) -> &[Bridge];

    fn get_bridges_mut(&mut self) -> &mut [Bridge];

    /// Appends one bridge device per registered bridge.
    fn append_bridges(&self, devices: Vec<Device>) -> Vec<Device>;

    fn cpu_model(&self) -> String;

    fn memory_topology(&self, memory_mb: u64, host_memory_mb: u64, slots: u8) -> Memory;

    /// Appends the root image, as an NVDIMM or as a virtio-blk disk.
    fn append_image(&self, devices: Vec<Device>, path: &Path) -> Result<Vec<Device>>;

    fn append_block_device(&self, devices: Vec<Device>, drive: &BlockDrive) -> Vec<Device>;

    fn append_iommu(&self, devices: Vec<Device>) -> Result<Vec<Device>>;

    fn kernel_parameters(&self, debug: bool) -> KernelParams;

    fn machine(&self) -> Result<Machine>;

    /// This builder's view of the machine catalog, options included.
    fn supported_machines(&self) -> &[Machine];

    fn disable_nesting_checks(&mut self);

    fn set_vm_factory(&mut self, factory: bool);

    fn support_guest_memory_hotplug(&self) -> bool;

    fn qemu_path(&self) -> Result<PathBuf>;

    fn max_vcpus(&self) -> u32;
}

/// Builds the architecture rules for `config`, rejecting machine types
/// outside the catalog.
pub fn new_qemu_arch(config: &HypervisorConfig) -> Result<Box<dyn QemuArch>> {
    config.machine_type.parse::<MachineType>()?;
    Ok(Box::new(QemuAmd64::new(config)))
}
