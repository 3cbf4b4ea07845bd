//! Assembly of the full QEMU argument vector for a sandbox VM.

use crate::arch::QemuArch;
use crate::config::HypervisorConfig;
use crate::device::{Device, Machine, Memory};
use sandvm_core::{Error, KernelParams, Result};

/// Everything QEMU needs to shape the VM, in launch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub machine: Machine,
    pub cpu_model: String,
    pub vcpus: u32,
    pub memory: Memory,
    pub devices: Vec<Device>,
    pub kernel_params: KernelParams,
}

impl LaunchPlan {
    /// Runs the builder through machine, bridges, CPU, memory and devices.
    ///
    /// `host_memory_mb` bounds memory hotplug; it is ignored on machine
    /// types without hotplug support.
    pub fn assemble(
        arch: &mut dyn QemuArch,
        config: &HypervisorConfig,
        host_memory_mb: u64,
    ) -> Result<Self> {
        if config.vcpus == 0 || config.vcpus > arch.max_vcpus() {
            return Err(Error::InvalidConfig(format!(
                "vcpus must be between 1 and {}",
                arch.max_vcpus()
            )));
        }

        let machine = arch.machine()?;

        arch.bridges(config.default_bridges);
        let cpu_model = arch.cpu_model();

        let memory = if arch.support_guest_memory_hotplug() {
            arch.memory_topology(config.memory_mb, host_memory_mb, config.memory_slots)
        } else {
            Memory::fixed(config.memory_mb)
        };

        let mut devices = arch.append_bridges(Vec::new());
        if config.iommu {
            devices = arch.append_iommu(devices)?;
        }
        if let Some(image) = &config.image_path {
            devices = arch.append_image(devices, image)?;
        }

        tracing::debug!(
            machine = %machine.machine_type,
            devices = devices.len(),
            "assembled launch plan"
        );

        Ok(Self {
            machine,
            cpu_model,
            vcpus: config.vcpus,
            memory,
            devices,
            kernel_params: arch.kernel_parameters(config.debug),
        })
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.machine.qemu_params();
        args.push("-cpu".to_string());
        args.push(self.cpu_model.clone());
        args.push("-smp".to_string());
        args.push(self.vcpus.to_string());
        args.extend(self.memory.qemu_params());
        for device in &self.devices {
            args.extend(device.qemu_params());
        }
        args.push("-append".to_string());
        args.push(self.kernel_params.build());
        args
    }
}
