use crate::machine::DEFAULT_MACHINE_TYPE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hypervisor settings a topology builder is constructed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypervisorConfig {
    /// Machine type name. Kept as a string so unknown names can be
    /// reported instead of failing deserialization.
    pub machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qemu_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initrd_path: Option<PathBuf>,
    /// Attach the image as a virtio-blk disk instead of an NVDIMM.
    pub disable_image_nvdimm: bool,
    pub disable_nesting_checks: bool,
    /// This VM will be snapshotted as a factory template.
    pub boot_to_be_template: bool,
    /// This VM is cloned from a factory template.
    pub boot_from_template: bool,
    pub iommu: bool,
    pub vcpus: u32,
    pub memory_mb: u64,
    pub memory_slots: u8,
    pub default_bridges: u32,
    pub debug: bool,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            qemu_path: None,
            image_path: None,
            initrd_path: None,
            disable_image_nvdimm: false,
            disable_nesting_checks: false,
            boot_to_be_template: false,
            boot_from_template: false,
            iommu: false,
            vcpus: 1,
            memory_mb: 2048,
            memory_slots: 10,
            default_bridges: 1,
            debug: false,
        }
    }
}

impl HypervisorConfig {
    pub fn new(machine_type: impl Into<String>) -> Self {
        Self {
            machine_type: machine_type.into(),
            ..Default::default()
        }
    }

    /// Whether the VM takes part in VM factory templating.
    pub fn is_vm_factory(&self) -> bool {
        self.boot_to_be_template || self.boot_from_template
    }
}
