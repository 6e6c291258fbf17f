pub mod config;
pub mod dbus;
pub mod file_lock;
pub mod logger;
pub mod shutdown;

use anyhow::Context;
use aprs::{ApInterfaceManager, ApInterfaceService};
use clap::{ArgAction, Parser};
use log::{info, warn};
use std::path::PathBuf;

use crate::config::{DaemonConfig, default_config_path};
use crate::file_lock::{acquire_daemon_lock, default_lock_path};
use crate::shutdown::shutdown_signal;

#[derive(Parser, Debug)]
#[command(name = "aprsd")]
#[command(about = "Runs a hostapd access point and exposes it over D-Bus")]
#[command(disable_version_flag = true)]
#[command(version)]
struct Args {
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// Daemon config file (default: $XDG_CONFIG_HOME/aprs/aprsd.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wireless interface to run the access point on
    #[arg(short, long)]
    interface: Option<String>,

    /// Where the generated hostapd config is written
    #[arg(long)]
    hostapd_config: Option<PathBuf>,

    /// Serve on the session bus instead of the system bus
    #[arg(long)]
    session: bool,
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.version {
        println!("aprsd {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    logger::init();

    let lock_path = default_lock_path();
    let _lock = acquire_daemon_lock(&lock_path).map_err(anyhow::Error::msg)?;

    let daemon_config = match (&args.config, default_config_path()) {
        (Some(path), _) => DaemonConfig::load(path)?,
        (None, Some(path)) => DaemonConfig::load_or_default(&path)?,
        (None, None) => DaemonConfig::default(),
    };
    let mut ap_config = daemon_config.into_ap_config();
    if let Some(interface) = args.interface {
        ap_config = ap_config.with_interface(interface);
    }
    if let Some(path) = args.hostapd_config {
        ap_config = ap_config.with_config_path(path);
    }
    info!(
        "Managing AP interface {} with {}",
        ap_config.interface,
        ap_config.hostapd_binary.display()
    );

    let signalled = shutdown_signal().context("failed to install signal handlers")?;

    let service = ApInterfaceService::new(ApInterfaceManager::with_config(ap_config));
    let _conn = dbus::serve(service.clone(), args.session)
        .await
        .context("failed to serve on D-Bus")?;

    let signal = signalled
        .await
        .context("failed to wait for shutdown signal")?;
    info!("Received {signal}, shutting down");

    if let Some(e) = service.tear_down_interfaces().await.error() {
        warn!("Tear-down on shutdown failed: {e}");
    }
    Ok(())
}
