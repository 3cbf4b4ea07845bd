mod commands;

use clap::{Parser, Subcommand};
use commands::{machines, plan, version, watch};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandvm")]
#[command(about = "Inspect QEMU sandbox topologies and watch sandbox health")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported QEMU machine types and what they support
    Machines(machines::MachinesArgs),

    /// Print the QEMU arguments for a hypervisor configuration
    Plan(plan::PlanArgs),

    /// Watch a running sandbox and report health failures
    Watch(watch::WatchArgs),

    /// Show version information
    Version(version::VersionArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Machines(args) => machines::run(args),
        Commands::Plan(args) => plan::run(args)?,
        Commands::Watch(args) => watch::run(args).await?,
        Commands::Version(args) => version::run(args),
    }

    Ok(())
}
