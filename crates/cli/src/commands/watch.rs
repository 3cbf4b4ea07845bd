//! The `watch` command - reports health failures of a running sandbox
//! until interrupted.

use clap::Args;
use sandvm::{Monitor, ProcessHypervisor, SocketAgent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct WatchArgs {
    /// PID of the hypervisor process
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    pid: i32,

    /// Host path of the guest agent socket
    #[arg(long)]
    agent_socket: PathBuf,

    /// Interval between health checks in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,
}

pub async fn run(args: WatchArgs) -> anyhow::Result<()> {
    let monitor = Monitor::with_check_interval(
        Arc::new(ProcessHypervisor::new(args.pid)?),
        Arc::new(SocketAgent::new(&args.agent_socket)),
        Duration::from_millis(args.interval_ms),
    );
    let mut watcher = monitor.new_watcher()?;

    tracing::info!(
        pid = args.pid,
        socket = %args.agent_socket.display(),
        "watching sandbox"
    );

    let mut failures = 0usize;
    loop {
        tokio::select! {
            err = watcher.recv() => match err {
                Some(err) => {
                    failures += 1;
                    eprintln!("sandbox unhealthy: {err}");
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted, stopping monitor...");
                break;
            }
        }
    }

    monitor.stop().await;
    tracing::info!(failures, "monitor stopped");
    Ok(())
}
