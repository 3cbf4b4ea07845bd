//! QEMU machine and device topology for sandvm sandboxes.
//!
//! Given a [`HypervisorConfig`], a [`QemuArch`] implementation decides the
//! PCI bridges, CPU model, memory layout, kernel parameters and image
//! devices that match the chosen machine type. [`LaunchPlan`] drives it
//! in the usual order and renders the QEMU argument vector.
//!
//! ```
//! use sandvm_qemu::{HypervisorConfig, LaunchPlan, new_qemu_arch};
//!
//! # fn example() -> sandvm_core::Result<()> {
//! let config = HypervisorConfig::new("q35");
//! let mut arch = new_qemu_arch(&config)?;
//! let plan = LaunchPlan::assemble(arch.as_mut(), &config, 8192)?;
//! println!("{}", plan.to_args().join(" "));
//! # Ok(())
//! # }
//! ```

pub mod arch;
pub mod config;
pub mod device;
pub mod launch;
pub mod machine;

pub use arch::{QemuAmd64, QemuArch, new_qemu_arch};
pub use config::HypervisorConfig;
pub use device::{
    BlockAio, BlockDevice, BlockDrive, BlockDriver, BridgeDevice, BridgeKind, Device, IommuDevice,
    Machine, Memory, Object, ObjectDriver, ObjectType,
};
pub use launch::LaunchPlan;
pub use machine::{MachineSupport, MachineType, supported_machines};
