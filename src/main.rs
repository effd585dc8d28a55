//! bridgevisor daemon binary.
//!
//! Wires the sysfs control layer into the daemon core and runs the reactor.
//! Reload with SIGHUP, publish status with SIGUSR1, stop with SIGTERM.

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bridgevisor::control::SysfsControl;
use bridgevisor::{Daemon, DaemonConfig, InstancePaths};

#[derive(Debug, Parser)]
#[command(name = "bridgevisor", about = "Network-bridge management daemon")]
struct Args {
    /// Bridge instance number; selects config file and status subdirectory.
    #[arg(long, default_value_t = 0)]
    instance: u32,

    /// Interface name of the managed bridge.
    #[arg(long, default_value = "br0")]
    bridge: String,

    /// Configuration file override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Status-directory root override.
    #[arg(long)]
    status_root: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bridgevisor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut paths = InstancePaths::for_instance(args.instance);
    if let Some(config) = args.config {
        paths.config_file = config;
    }
    if let Some(root) = args.status_root {
        paths.status_text = root.join("bridgevisor.status");
        paths.status_root = root;
    }

    tracing::info!(
        instance = args.instance,
        bridge = %args.bridge,
        config = %paths.config_file.display(),
        "bridgevisor starting"
    );

    let control = Rc::new(SysfsControl::new());
    let daemon = Daemon::builder(
        DaemonConfig {
            instance: args.instance,
            bridge: args.bridge,
        },
        control,
    )
    .with_paths(paths)
    .build()?;

    daemon.run()?;
    Ok(())
}
