use super::QemuArch;
use crate::config::HypervisorConfig;
use crate::device::{
    BlockAio, BlockDevice, BlockDrive, BlockDriver, BridgeDevice, BridgeKind, DEFAULT_BRIDGE_BUS,
    DEFAULT_PC_BRIDGE_BUS, Device, IommuDevice, Machine, Memory, Object, ObjectDriver, ObjectType,
};
use crate::machine::{
    IOMMU_MACHINE_OPTIONS, MachineSupport, MachineType, NVDIMM_OPTION, supported_machines,
};
use sandvm_core::{Bridge, BridgeType, Capabilities, Error, KernelParams, Param, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_QEMU_PATH: &str = "/usr/bin/qemu-system-x86_64";
const QEMU_BINARY: &str = "qemu-system-x86_64";

pub const DEFAULT_CPU_MODEL: &str = "host";

/// Hotplug headroom above host memory, in MiB.
pub const MEMORY_OFFSET_MB: u64 = 1024;

pub const MAX_QEMU_VCPUS: u32 = 240;

const NVDIMM_DEVICE_ID: &str = "nv0";
const NVDIMM_BACKEND_ID: &str = "mem0";

// Device ids are capped at 31 characters.
const IMAGE_ID_HEX_LEN: usize = 16;

fn base_kernel_params() -> KernelParams {
    [
        Param::new("tsc", "reliable"),
        Param::flag("no_timer_check"),
        Param::new("rcupdate.rcu_expedited", "1"),
        Param::new("i8042.direct", "1"),
        Param::new("i8042.dumbkbd", "1"),
        Param::new("i8042.nopnp", "1"),
        Param::new("i8042.noaux", "1"),
        Param::flag("noreplace-smp"),
        Param::new("reboot", "k"),
        Param::new("console", "hvc0"),
        Param::new("console", "hvc1"),
        Param::new("iommu", "off"),
        Param::flag("cryptomgr.notests"),
        Param::new("net.ifnames", "0"),
        Param::new("pci", "lastbus=0"),
    ]
    .into_iter()
    .collect()
}

fn nvdimm_root_params() -> [Param; 3] {
    [
        Param::new("root", "/dev/pmem0p1"),
        Param::new("rootflags", "dax,data=ordered,errors=remount-ro ro"),
        Param::new("rootfstype", "ext4"),
    ]
}

fn virtio_blk_root_params() -> [Param; 3] {
    [
        Param::new("root", "/dev/vda1"),
        Param::new("rootflags", "data=ordered,errors=remount-ro ro"),
        Param::new("rootfstype", "ext4"),
    ]
}

/// amd64 rules for the `pc`, `q35` and `microvm` machine types.
#[derive(Debug, Clone)]
pub struct QemuAmd64 {
    machine_name: String,
    machine_type: Option<MachineType>,
    machines: Vec<Machine>,
    bridges: Vec<Bridge>,
    kernel_params: KernelParams,
    kernel_params_debug: KernelParams,
    kernel_params_non_debug: KernelParams,
    image_nvdimm: bool,
    nested_run: bool,
    vm_factory: bool,
    qemu_path: Option<PathBuf>,
}

impl QemuAmd64 {
    /// Builds the rules for `config`.
    ///
    /// An unknown machine type is accepted here and yields an empty,
    /// capability-less topology; [`QemuArch::machine`] reports it. Use
    /// [`new_qemu_arch`](super::new_qemu_arch) to fail early instead.
    pub fn new(config: &HypervisorConfig) -> Self {
        let machine_type = config.machine_type.parse::<MachineType>().ok();
        let support = machine_type
            .map(|m| m.support())
            .unwrap_or_default();

        let mut machines = supported_machines();
        let mut kernel_params = base_kernel_params();

        if config.iommu {
            for machine in &mut machines {
                if machine.machine_type == MachineType::Q35.as_str() {
                    machine.options = IOMMU_MACHINE_OPTIONS.to_string();
                }
            }
            kernel_params
                .remove("iommu", "off")
                .push(Param::new("intel_iommu", "on"))
                .push(Param::new("iommu", "pt"));
        }

        let mut kernel_params_debug: KernelParams = [Param::flag("debug")].into_iter().collect();
        let mut kernel_params_non_debug: KernelParams =
            [Param::flag("quiet")].into_iter().collect();

        let image_nvdimm =
            config.image_path.is_some() && !config.disable_image_nvdimm && support.nvdimm;

        if config.image_path.is_some() {
            if image_nvdimm {
                for machine in &mut machines {
                    machine.options = format!("{},{}", machine.options, NVDIMM_OPTION);
                }
                kernel_params.extend(nvdimm_root_params());
            } else {
                kernel_params.extend(virtio_blk_root_params());
            }
            kernel_params_non_debug.push(Param::new("systemd.show_status", "false"));
            kernel_params_debug
                .push(Param::new("systemd.show_status", "true"))
                .push(Param::new("systemd.log_level", "debug"));
        }

        tracing::debug!(
            machine_type = %config.machine_type,
            image_nvdimm,
            iommu = config.iommu,
            "configured amd64 machine"
        );

        Self {
            machine_name: config.machine_type.clone(),
            machine_type,
            machines,
            bridges: Vec::new(),
            kernel_params,
            kernel_params_debug,
            kernel_params_non_debug,
            image_nvdimm,
            nested_run: config.disable_nesting_checks,
            vm_factory: config.is_vm_factory(),
            qemu_path: config.qemu_path.clone(),
        }
    }

    fn support(&self) -> MachineSupport {
        self.machine_type.map(|m| m.support()).unwrap_or_default()
    }

    fn append_nvdimm_image(&self, mut devices: Vec<Device>, path: &Path) -> Result<Vec<Device>> {
        let size = image_size(path)?;
        devices.push(Device::Object(Object {
            driver: ObjectDriver::Nvdimm,
            object_type: ObjectType::MemoryBackendFile,
            device_id: NVDIMM_DEVICE_ID.to_string(),
            id: NVDIMM_BACKEND_ID.to_string(),
            mem_path: path.to_path_buf(),
            size,
        }));
        Ok(devices)
    }

    fn append_block_image(&self, devices: Vec<Device>, path: &Path) -> Result<Vec<Device>> {
        image_size(path)?;
        let hex = uuid::Uuid::new_v4().simple().to_string();
        let drive = BlockDrive {
            id: format!("image-{}", &hex[..IMAGE_ID_HEX_LEN]),
            file: path.to_path_buf(),
            // The same image backs every VM cloned from a factory template.
            share_rw: true,
        };
        Ok(self.append_block_device(devices, &drive))
    }
}

fn image_size(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| Error::ImageStat {
            path: path.to_path_buf(),
            source,
        })
}

impl QemuArch for QemuAmd64 {
    fn capabilities(&self) -> Capabilities {
        let support = self.support();
        Capabilities {
            block_device: true,
            block_device_hotplug: support.block_device_hotplug,
            multi_queue: true,
            fs_sharing: true,
            memory_hotplug: support.memory_hotplug,
            bridges: support.bridges,
        }
    }

    fn bridges(&mut self, count: u32) {
        if !self.support().bridges {
            self.bridges = Vec::new();
            return;
        }
        self.bridges = (0..count).map(|i| Bridge::new(BridgeType::Pci, i)).collect();
    }

    fn get_bridges(&self) -> &[Bridge] {
        &self.bridges
    }

    fn get_bridges_mut(&mut self) -> &mut [Bridge] {
        &mut self.bridges
    }

    fn append_bridges(&self, mut devices: Vec<Device>) -> Vec<Device> {
        let bus = match self.machine_type {
            Some(MachineType::Q35) => DEFAULT_BRIDGE_BUS,
            _ => DEFAULT_PC_BRIDGE_BUS,
        };

        for (idx, bridge) in self.bridges.iter().enumerate() {
            let kind = match bridge.bridge_type {
                BridgeType::Pci => BridgeKind::PciBridge,
            };
            devices.push(Device::Bridge(BridgeDevice {
                kind,
                bus: bus.to_string(),
                id: bridge.id.clone(),
                chassis: idx as u32 + 1,
                shpc: true,
                addr: bridge.addr.to_string(),
            }));
        }
        devices
    }

    fn cpu_model(&self) -> String {
        let mut model = DEFAULT_CPU_MODEL.to_string();
        // VMX state does not survive cloning from a factory template.
        if self.nested_run && self.vm_factory {
            tracing::warn!("VMX is not migratable yet: turning it off");
            model.push_str(",vmx=off");
        }
        model
    }

    fn memory_topology(&self, memory_mb: u64, host_memory_mb: u64, slots: u8) -> Memory {
        Memory {
            size: format!("{memory_mb}M"),
            slots,
            max_mem: format!("{}M", host_memory_mb.saturating_add(MEMORY_OFFSET_MB)),
        }
    }

    fn append_image(&self, devices: Vec<Device>, path: &Path) -> Result<Vec<Device>> {
        if self.image_nvdimm {
            self.append_nvdimm_image(devices, path)
        } else {
            self.append_block_image(devices, path)
        }
    }

    fn append_block_device(&self, mut devices: Vec<Device>, drive: &BlockDrive) -> Vec<Device> {
        devices.push(Device::Block(BlockDevice {
            driver: BlockDriver::VirtioBlock,
            id: drive.id.clone(),
            file: drive.file.clone(),
            aio: BlockAio::Threads,
            format: "raw".to_string(),
            interface: "none".to_string(),
            share_rw: drive.share_rw,
        }));
        devices
    }

    fn append_iommu(&self, mut devices: Vec<Device>) -> Result<Vec<Device>> {
        if !self.support().iommu {
            return Err(Error::UnsupportedFeature(format!(
                "vIOMMU on machine type {}",
                self.machine_name
            )));
        }
        devices.push(Device::Iommu(IommuDevice {
            intremap: true,
            device_iotlb: true,
            caching_mode: true,
        }));
        Ok(devices)
    }

    fn kernel_parameters(&self, debug: bool) -> KernelParams {
        let mut params = self.kernel_params.clone();
        if debug {
            params.extend(self.kernel_params_debug.iter().cloned());
        } else {
            params.extend(self.kernel_params_non_debug.iter().cloned());
        }
        params
    }

    fn machine(&self) -> Result<Machine> {
        self.machines
            .iter()
            .find(|m| m.machine_type == self.machine_name)
            .cloned()
            .ok_or_else(|| Error::UnsupportedMachine(self.machine_name.clone()))
    }

    fn supported_machines(&self) -> &[Machine] {
        &self.machines
    }

    fn disable_nesting_checks(&mut self) {
        self.nested_run = true;
    }

    fn set_vm_factory(&mut self, factory: bool) {
        self.vm_factory = factory;
    }

    fn support_guest_memory_hotplug(&self) -> bool {
        self.machine_type != Some(MachineType::Microvm)
    }

    fn qemu_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.qemu_path {
            return Ok(path.clone());
        }
        let default = PathBuf::from(DEFAULT_QEMU_PATH);
        if default.is_file() {
            return Ok(default);
        }
        which::which(QEMU_BINARY)
            .map_err(|e| Error::Hypervisor(format!("{QEMU_BINARY} not found: {e}")))
    }

    fn max_vcpus(&self) -> u32 {
        MAX_QEMU_VCPUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{QEMU_MICROVM, QEMU_PC, QEMU_Q35};
    use std::io::Write;

    fn new_test_qemu(machine_type: &str) -> QemuAmd64 {
        QemuAmd64::new(&HypervisorConfig::new(machine_type))
    }

    fn image_file(len: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; len]).unwrap();
        file.flush().unwrap();
        file
    }

    mod capabilities {
        use super::*;

        #[test]
        fn block_hotplug_on_pc_and_q35_only() {
            assert!(
                new_test_qemu(QEMU_PC)
                    .capabilities()
                    .is_block_device_hotplug_supported()
            );
            assert!(
                new_test_qemu(QEMU_Q35)
                    .capabilities()
                    .is_block_device_hotplug_supported()
            );
            assert!(
                !new_test_qemu(QEMU_MICROVM)
                    .capabilities()
                    .is_block_device_hotplug_supported()
            );
        }

        #[test]
        fn microvm_has_no_bridges_or_memory_hotplug() {
            let caps = new_test_qemu(QEMU_MICROVM).capabilities();
            assert!(!caps.is_bridging_supported());
            assert!(!caps.is_memory_hotplug_supported());
            assert!(caps.is_block_device_supported());
        }
    }

    mod bridges {
        use super::*;

        #[test]
        fn allocates_sequential_ids() {
            for machine_type in [QEMU_PC, QEMU_Q35] {
                let mut amd64 = new_test_qemu(machine_type);
                amd64.bridges(5);
                let bridges = amd64.get_bridges();
                assert_eq!(bridges.len(), 5);

                for (i, b) in bridges.iter().enumerate() {
                    assert_eq!(b.bridge_type, BridgeType::Pci);
                    assert_eq!(b.id, format!("pci-bridge-{i}"));
                    assert!(b.devices.is_empty());
                }
            }
        }

        #[test]
        fn zero_bridges() {
            let mut amd64 = new_test_qemu(QEMU_PC);
            amd64.bridges(0);
            assert!(amd64.get_bridges().is_empty());
        }

        #[test]
        fn reallocation_replaces_registry() {
            let mut amd64 = new_test_qemu(QEMU_Q35);
            amd64.bridges(3);
            amd64.get_bridges_mut()[0].add_device("blk0").unwrap();
            amd64.bridges(2);
            assert_eq!(amd64.get_bridges().len(), 2);
            assert!(amd64.get_bridges()[0].devices.is_empty());
        }

        #[test]
        fn microvm_has_none() {
            let mut amd64 = new_test_qemu(QEMU_MICROVM);
            amd64.bridges(5);
            assert!(amd64.get_bridges().is_empty());
        }

        #[test]
        fn invalid_machine_type_has_none() {
            let mut amd64 = new_test_qemu("q35pc");
            amd64.bridges(5);
            assert!(amd64.get_bridges().is_empty());
        }
    }

    mod append_bridges {
        use super::*;

        fn expected(bus: &str, id: &str) -> Vec<Device> {
            vec![Device::Bridge(BridgeDevice {
                kind: BridgeKind::PciBridge,
                bus: bus.to_string(),
                id: id.to_string(),
                chassis: 1,
                shpc: true,
                addr: "2".to_string(),
            })]
        }

        #[test]
        fn pc_uses_legacy_bus() {
            let mut amd64 = new_test_qemu(QEMU_PC);
            amd64.bridges(1);
            let id = amd64.get_bridges()[0].id.clone();

            let devices = amd64.append_bridges(Vec::new());
            assert_eq!(devices, expected(DEFAULT_PC_BRIDGE_BUS, &id));
        }

        #[test]
        fn q35_uses_pcie_bus() {
            let mut amd64 = new_test_qemu(QEMU_Q35);
            amd64.bridges(1);
            let id = amd64.get_bridges()[0].id.clone();

            let devices = amd64.append_bridges(Vec::new());
            assert_eq!(devices, expected(DEFAULT_BRIDGE_BUS, &id));
        }

        #[test]
        fn preserves_existing_devices_and_numbers_chassis() {
            let mut amd64 = new_test_qemu(QEMU_PC);
            amd64.bridges(2);

            let existing = Device::Iommu(IommuDevice {
                intremap: true,
                device_iotlb: true,
                caching_mode: true,
            });
            let devices = amd64.append_bridges(vec![existing.clone()]);
            assert_eq!(devices.len(), 3);
            assert_eq!(devices[0], existing);

            let chassis: Vec<(u32, String)> = devices[1..]
                .iter()
                .map(|d| match d {
                    Device::Bridge(b) => (b.chassis, b.addr.clone()),
                    other => panic!("unexpected device {other:?}"),
                })
                .collect();
            assert_eq!(chassis, vec![(1, "2".to_string()), (2, "3".to_string())]);
        }
    }

    mod cpu_model {
        use super::*;

        #[test]
        fn default_is_host() {
            assert_eq!(new_test_qemu(QEMU_PC).cpu_model(), DEFAULT_CPU_MODEL);
        }

        #[test]
        fn factory_with_nesting_disabled_turns_vmx_off() {
            let mut amd64 = new_test_qemu(QEMU_PC);
            amd64.disable_nesting_checks();
            amd64.set_vm_factory(true);

            let expected = format!("{DEFAULT_CPU_MODEL},vmx=off");
            assert_eq!(amd64.cpu_model(), expected);
            assert_eq!(amd64.cpu_model(), expected);
        }

        #[test]
        fn factory_alone_keeps_vmx() {
            let mut config = HypervisorConfig::new(QEMU_PC);
            config.boot_from_template = true;
            assert_eq!(QemuAmd64::new(&config).cpu_model(), DEFAULT_CPU_MODEL);
        }

        #[test]
        fn config_flags_feed_cpu_model() {
            let mut config = HypervisorConfig::new(QEMU_Q35);
            config.boot_to_be_template = true;
            config.disable_nesting_checks = true;
            assert_eq!(
                QemuAmd64::new(&config).cpu_model(),
                format!("{DEFAULT_CPU_MODEL},vmx=off")
            );
        }
    }

    #[test]
    fn memory_topology_adds_offset() {
        let amd64 = new_test_qemu(QEMU_PC);
        let memory = amd64.memory_topology(120, 100, 10);
        assert_eq!(
            memory,
            Memory {
                size: "120M".to_string(),
                slots: 10,
                max_mem: "1124M".to_string(),
            }
        );
    }

    #[test]
    fn memory_topology_saturates_huge_host_memory() {
        let amd64 = new_test_qemu(QEMU_PC);
        let memory = amd64.memory_topology(1, u64::MAX, 1);
        assert_eq!(memory.max_mem, format!("{}M", u64::MAX));
    }

    mod append_image {
        use super::*;

        #[test]
        fn nvdimm_object_matches_file_size() {
            let file = image_file(4096);
            let mut config = HypervisorConfig::new(QEMU_PC);
            config.image_path = Some(file.path().to_path_buf());

            let amd64 = QemuAmd64::new(&config);
            for machine in amd64.supported_machines() {
                assert!(machine.has_option(NVDIMM_OPTION));
            }

            let devices = amd64.append_image(Vec::new(), file.path()).unwrap();
            assert_eq!(
                devices,
                vec![Device::Object(Object {
                    driver: ObjectDriver::Nvdimm,
                    object_type: ObjectType::MemoryBackendFile,
                    device_id: "nv0".to_string(),
                    id: "mem0".to_string(),
                    mem_path: file.path().to_path_buf(),
                    size: 4096,
                })]
            );
        }

        #[test]
        fn nvdimm_disabled_uses_shared_virtio_blk() {
            let file = image_file(512);
            let mut config = HypervisorConfig::new(QEMU_PC);
            config.image_path = Some(file.path().to_path_buf());
            config.disable_image_nvdimm = true;

            let amd64 = QemuAmd64::new(&config);
            for machine in amd64.supported_machines() {
                assert!(!machine.has_option(NVDIMM_OPTION));
            }

            let devices = amd64.append_image(Vec::new(), file.path()).unwrap();
            assert_eq!(devices.len(), 1);
            match &devices[0] {
                Device::Block(block) => {
                    assert_eq!(block.driver, BlockDriver::VirtioBlock);
                    assert!(block.share_rw);
                    assert_eq!(block.file, file.path());
                    assert!(block.id.starts_with("image-"));
                    assert!(block.id.len() <= 31);
                }
                other => panic!("expected block device, got {other:?}"),
            }
        }

        #[test]
        fn instances_do_not_share_machine_options() {
            let file = image_file(16);
            let mut with_image = HypervisorConfig::new(QEMU_PC);
            with_image.image_path = Some(file.path().to_path_buf());

            let nvdimm = QemuAmd64::new(&with_image);
            let plain = new_test_qemu(QEMU_PC);

            assert!(nvdimm.machine().unwrap().has_option(NVDIMM_OPTION));
            assert!(!plain.machine().unwrap().has_option(NVDIMM_OPTION));
        }

        #[test]
        fn missing_image_is_stat_error() {
            let dir = tempfile::tempdir().unwrap();
            let missing = dir.path().join("missing.img");

            let mut config = HypervisorConfig::new(QEMU_PC);
            config.image_path = Some(missing.clone());
            let amd64 = QemuAmd64::new(&config);

            let err = amd64.append_image(Vec::new(), &missing).unwrap_err();
            assert!(matches!(err, Error::ImageStat { ref path, .. } if *path == missing));

            config.disable_image_nvdimm = true;
            let amd64 = QemuAmd64::new(&config);
            assert!(amd64.append_image(Vec::new(), &missing).is_err());
        }

        #[test]
        fn initrd_only_does_not_enable_nvdimm() {
            let mut config = HypervisorConfig::new(QEMU_PC);
            config.initrd_path = Some(PathBuf::from("dummy-initrd"));

            let amd64 = QemuAmd64::new(&config);
            for machine in amd64.supported_machines() {
                assert!(!machine.has_option(NVDIMM_OPTION));
            }
        }
    }

    #[test]
    fn microvm_never_uses_nvdimm_or_memory_hotplug() {
        let file = image_file(64);
        let mut config = HypervisorConfig::new(QEMU_MICROVM);
        config.image_path = Some(file.path().to_path_buf());

        let amd64 = QemuAmd64::new(&config);
        assert!(!config.disable_image_nvdimm);
        for machine in amd64.supported_machines() {
            assert!(!machine.has_option(NVDIMM_OPTION));
        }
        assert!(!amd64.support_guest_memory_hotplug());

        let devices = amd64.append_image(Vec::new(), file.path()).unwrap();
        assert!(matches!(devices[0], Device::Block(_)));
    }

    #[test]
    fn guest_memory_hotplug_outside_microvm() {
        assert!(new_test_qemu(QEMU_PC).support_guest_memory_hotplug());
        assert!(new_test_qemu(QEMU_Q35).support_guest_memory_hotplug());
    }

    mod iommu {
        use super::*;

        #[test]
        fn q35_gets_kernel_param_and_split_irqchip() {
            let mut config = HypervisorConfig::new(QEMU_Q35);
            config.iommu = true;
            let amd64 = QemuAmd64::new(&config);

            let params = amd64.kernel_parameters(false);
            assert!(params.contains(&Param::new("intel_iommu", "on")));
            assert!(params.contains(&Param::new("iommu", "pt")));
            assert!(!params.contains(&Param::new("iommu", "off")));

            let machine = amd64.machine().unwrap();
            assert!(machine.has_option("kernel_irqchip=split"));
        }

        #[test]
        fn disabled_by_default() {
            let amd64 = new_test_qemu(QEMU_Q35);
            let params = amd64.kernel_parameters(false);
            assert!(!params.contains(&Param::new("intel_iommu", "on")));
            assert!(params.contains(&Param::new("iommu", "off")));
            assert!(amd64.machine().unwrap().has_option("kernel_irqchip"));
        }

        #[test]
        fn append_iommu_on_q35() {
            let devices = new_test_qemu(QEMU_Q35).append_iommu(Vec::new()).unwrap();
            assert!(matches!(devices.as_slice(), [Device::Iommu(_)]));
        }

        #[test]
        fn append_iommu_rejected_on_pc() {
            let err = new_test_qemu(QEMU_PC).append_iommu(Vec::new()).unwrap_err();
            assert!(matches!(err, Error::UnsupportedFeature(_)));
        }
    }

    mod kernel_parameters {
        use super::*;

        #[test]
        fn keeps_both_consoles() {
            let built = new_test_qemu(QEMU_PC).kernel_parameters(false).build();
            assert!(built.contains("console=hvc0 console=hvc1"));
        }

        #[test]
        fn debug_and_non_debug_tails() {
            let amd64 = new_test_qemu(QEMU_PC);
            assert!(
                amd64
                    .kernel_parameters(false)
                    .contains(&Param::flag("quiet"))
            );
            let debug = amd64.kernel_parameters(true);
            assert!(debug.contains(&Param::flag("debug")));
            assert!(!debug.contains(&Param::flag("quiet")));
        }

        #[test]
        fn image_adds_root_params() {
            let file = image_file(8);
            let mut config = HypervisorConfig::new(QEMU_PC);
            config.image_path = Some(file.path().to_path_buf());

            let params = QemuAmd64::new(&config).kernel_parameters(true);
            assert_eq!(params.get("root"), Some("/dev/pmem0p1"));
            assert_eq!(params.get("systemd.log_level"), Some("debug"));

            config.disable_image_nvdimm = true;
            let params = QemuAmd64::new(&config).kernel_parameters(false);
            assert_eq!(params.get("root"), Some("/dev/vda1"));
            assert_eq!(params.get("systemd.show_status"), Some("false"));
        }
    }

    #[test]
    fn machine_rejects_unknown_type() {
        let err = new_test_qemu("q35pc").machine().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMachine(ref name) if name == "q35pc"));
    }

    #[test]
    fn append_block_device_honors_share_rw() {
        let drive = BlockDrive {
            id: "drive-1".to_string(),
            file: PathBuf::from("/images/data.img"),
            share_rw: false,
        };
        let devices = new_test_qemu(QEMU_Q35).append_block_device(Vec::new(), &drive);
        match &devices[..] {
            [Device::Block(block)] => {
                assert_eq!(block.id, "drive-1");
                assert!(!block.share_rw);
                assert_eq!(block.aio, BlockAio::Threads);
                assert_eq!(block.format, "raw");
                assert_eq!(block.interface, "none");
            }
            other => panic!("unexpected devices {other:?}"),
        }
    }

    #[test]
    fn configured_qemu_path_wins() {
        let mut config = HypervisorConfig::new(QEMU_PC);
        config.qemu_path = Some(PathBuf::from("/opt/qemu/bin/qemu-system-x86_64"));
        assert_eq!(
            QemuAmd64::new(&config).qemu_path().unwrap(),
            PathBuf::from("/opt/qemu/bin/qemu-system-x86_64")
        );
    }

    #[test]
    fn max_vcpus_is_240() {
        assert_eq!(new_test_qemu(QEMU_PC).max_vcpus(), 240);
    }
}
