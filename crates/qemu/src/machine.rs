//! Catalog of supported amd64 machine types.
//!
//! The catalog is immutable. Per-VM tweaks to machine options (split IRQ
//! chip for vIOMMU, NVDIMM for image-backed roots) are applied to each
//! builder's own copy, see [`QemuAmd64`](crate::QemuAmd64).

use crate::device::Machine;
use sandvm_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const QEMU_PC: &str = "pc";
pub const QEMU_Q35: &str = "q35";
pub const QEMU_MICROVM: &str = "microvm";

pub const DEFAULT_MACHINE_TYPE: &str = QEMU_PC;
pub const DEFAULT_MACHINE_OPTIONS: &str = "accel=kvm,kernel_irqchip";

/// vIOMMU needs the IRQ chip split between KVM and QEMU.
pub const IOMMU_MACHINE_OPTIONS: &str = "accel=kvm,kernel_irqchip=split";

pub const NVDIMM_OPTION: &str = "nvdimm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineType {
    Pc,
    Q35,
    Microvm,
}

/// What a machine type's chipset allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineSupport {
    pub block_device_hotplug: bool,
    pub memory_hotplug: bool,
    pub bridges: bool,
    pub nvdimm: bool,
    pub iommu: bool,
}

impl MachineType {
    pub const ALL: [MachineType; 3] = [Self::Pc, Self::Q35, Self::Microvm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pc => QEMU_PC,
            Self::Q35 => QEMU_Q35,
            Self::Microvm => QEMU_MICROVM,
        }
    }

    pub fn support(&self) -> MachineSupport {
        match self {
            Self::Pc => MachineSupport {
                block_device_hotplug: true,
                memory_hotplug: true,
                bridges: true,
                nvdimm: true,
                iommu: false,
            },
            Self::Q35 => MachineSupport {
                block_device_hotplug: true,
                memory_hotplug: true,
                bridges: true,
                nvdimm: true,
                iommu: true,
            },
            Self::Microvm => MachineSupport::default(),
        }
    }

    /// Catalog entry with the default options.
    pub fn default_machine(&self) -> Machine {
        Machine::new(self.as_str(), DEFAULT_MACHINE_OPTIONS)
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            QEMU_PC => Ok(Self::Pc),
            QEMU_Q35 => Ok(Self::Q35),
            QEMU_MICROVM => Ok(Self::Microvm),
            other => Err(Error::UnsupportedMachine(other.to_string())),
        }
    }
}

/// The default catalog, one entry per supported machine type.
pub fn supported_machines() -> Vec<Machine> {
    MachineType::ALL
        .iter()
        .map(MachineType::default_machine)
        .collect()
}
