//! Daemon configuration file.
//!
//! All keys are optional; anything left out keeps the library default.
//! Durations are in milliseconds.
//!
//! ```toml
//! interface = "wlan1"
//!
//! [hostapd]
//! binary = "/usr/sbin/hostapd"
//! args = ["-dd"]
//! config_path = "/run/aprs/hostapd.conf"
//! ctrl_interface = "/run/hostapd"
//!
//! [timeouts]
//! startup_ms = 5000
//! settle_ms = 1500
//! ```

use anyhow::{Context, Result, bail};
use aprs::{ApConfig, TimeoutConfig};
use log::debug;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "aprs";
const CONFIG_FILE: &str = "aprsd.toml";

/// `$XDG_CONFIG_HOME/aprs/aprsd.toml`, if a config dir is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub interface: Option<String>,
    pub hostapd: HostapdSection,
    pub timeouts: TimeoutSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HostapdSection {
    pub binary: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    pub config_path: Option<PathBuf>,
    pub ctrl_interface: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSection {
    pub startup_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub death_ms: Option<u64>,
    pub interface_ms: Option<u64>,
    pub poll_ms: Option<u64>,
}

impl DaemonConfig {
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid daemon config")?;
        if config.timeouts.poll_ms == Some(0) {
            bail!("timeouts.poll_ms must be greater than zero");
        }
        Ok(config)
    }

    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Like [`DaemonConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::metadata(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            _ => Self::load(path),
        }
    }

    pub fn into_ap_config(self) -> ApConfig {
        let hostapd = self.hostapd;
        let mut config = ApConfig::default().with_timeouts(self.timeouts.into_timeout_config());

        if hostapd.binary.is_some() || hostapd.args.is_some() {
            let binary = hostapd.binary.unwrap_or_else(|| config.hostapd_binary.clone());
            let args = hostapd.args.unwrap_or_else(|| config.hostapd_args.clone());
            config = config.with_hostapd(binary, args);
        }
        if let Some(interface) = self.interface {
            config = config.with_interface(interface);
        }
        if let Some(path) = hostapd.config_path {
            config = config.with_config_path(path);
        }
        if let Some(path) = hostapd.ctrl_interface {
            config = config.with_ctrl_interface(path);
        }
        config
    }
}

impl TimeoutSection {
    fn into_timeout_config(self) -> TimeoutConfig {
        let mut timeouts = TimeoutConfig::new();
        if let Some(ms) = self.startup_ms {
            timeouts = timeouts.with_startup_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.settle_ms {
            timeouts = timeouts.with_settle_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.death_ms {
            timeouts = timeouts.with_death_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.interface_ms {
            timeouts = timeouts.with_interface_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.poll_ms {
            timeouts = timeouts.with_poll_interval(Duration::from_millis(ms));
        }
        timeouts
    }
}
