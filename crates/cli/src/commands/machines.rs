//! The `machines` command - lists supported machine types.

use super::yes_no;
use clap::Args;
use sandvm::qemu::MachineType;

#[derive(Args)]
pub struct MachinesArgs {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

pub fn run(args: MachinesArgs) {
    if args.json {
        print_json(&MachineType::ALL);
    } else {
        print_text(&MachineType::ALL);
    }
}

fn print_json(machines: &[MachineType]) {
    println!("{{");
    println!("  \"machines\": [");
    for (i, machine_type) in machines.iter().enumerate() {
        let machine = machine_type.default_machine();
        let support = machine_type.support();
        println!("    {{");
        println!("      \"type\": \"{}\",", machine.machine_type);
        println!("      \"options\": \"{}\",", machine.options);
        println!("      \"support\": {{");
        println!(
            "        \"block_device_hotplug\": {},",
            support.block_device_hotplug
        );
        println!("        \"memory_hotplug\": {},", support.memory_hotplug);
        println!("        \"bridges\": {},", support.bridges);
        println!("        \"nvdimm\": {},", support.nvdimm);
        println!("        \"iommu\": {}", support.iommu);
        println!("      }}");
        if i < machines.len() - 1 {
            println!("    }},");
        } else {
            println!("    }}");
        }
    }
    println!("  ]");
    println!("}}");
}

fn print_text(machines: &[MachineType]) {
    println!("Supported machine types:");
    println!();

    for machine_type in machines {
        let machine = machine_type.default_machine();
        let support = machine_type.support();

        println!("  {}", machine.machine_type);
        println!("    Options: {}", machine.options);
        println!(
            "    Hotplug: block={}, memory={}",
            yes_no(support.block_device_hotplug),
            yes_no(support.memory_hotplug)
        );
        println!("    PCI bridges: {}", yes_no(support.bridges));
        println!(
            "    Image: nvdimm={}, iommu={}",
            yes_no(support.nvdimm),
            yes_no(support.iommu)
        );
        println!();
    }
}
