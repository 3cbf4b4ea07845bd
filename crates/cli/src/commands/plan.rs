//! The `plan` command - prints the QEMU command line for a configuration.

use anyhow::Context;
use clap::Args;
use sandvm::qemu::{HypervisorConfig, LaunchPlan, new_qemu_arch};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_HOST_MEMORY_MB: u64 = 8192;

#[derive(Args)]
pub struct PlanArgs {
    /// Path to a TOML configuration file with a [hypervisor] table
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Machine type (pc, q35, microvm)
    #[arg(long)]
    machine_type: Option<String>,

    /// Guest image to attach
    #[arg(long, value_parser = parse_existing_file)]
    image: Option<PathBuf>,

    /// Number of PCI bridges to add
    #[arg(long)]
    bridges: Option<u32>,

    /// Host memory in MB, bounds memory hotplug
    #[arg(long, default_value_t = DEFAULT_HOST_MEMORY_MB)]
    host_memory_mb: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    hypervisor: HypervisorConfig,
}

fn parse_existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if !path.exists() {
        return Err(format!("file not found: {s}"));
    }
    if !path.is_file() {
        return Err(format!("not a file: {s}"));
    }
    Ok(path)
}

fn load_config(path: &Path) -> anyhow::Result<HypervisorConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(file.hypervisor)
}

fn resolve_config(args: &PlanArgs) -> anyhow::Result<HypervisorConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => HypervisorConfig::default(),
    };

    if let Some(machine_type) = &args.machine_type {
        config.machine_type = machine_type.clone();
    }
    if let Some(image) = &args.image {
        config.image_path = Some(image.clone());
    }
    if let Some(bridges) = args.bridges {
        config.default_bridges = bridges;
    }
    Ok(config)
}

pub fn run(args: PlanArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let mut arch = new_qemu_arch(&config)?;
    let plan = LaunchPlan::assemble(arch.as_mut(), &config, args.host_memory_mb)?;

    let binary = match arch.qemu_path() {
        Ok(path) => path.display().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "qemu binary not found");
            "qemu-system-x86_64".to_string()
        }
    };

    println!("{binary} \\");
    let args = plan.to_args();
    let mut iter = args.chunks(2).peekable();
    while let Some(pair) = iter.next() {
        let tail = if iter.peek().is_some() { " \\" } else { "" };
        println!("  {}{tail}", pair.join(" "));
    }

    Ok(())
}
