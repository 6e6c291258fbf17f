//! Interface administrative state (up/down).
//!
//! [`InterfaceStateGateway`] is the only way the rest of the crate touches
//! the kernel's view of an interface. The default [`LinkStateGateway`] reads
//! the flags sysfs exposes and shells out to `ip link` to change them.

use async_trait::async_trait;
use log::debug;
use std::io;
use std::path::PathBuf;
use tokio::process::Command;

use crate::types::constants::paths;
use crate::types::interface_flags::InterfaceFlags;

/// Query and set the administrative up/down bit of a network interface.
///
/// Implementations hold no state. Errors are reported as-is and never
/// retried; callers treat them as fatal for the operation in progress.
#[async_trait]
pub trait InterfaceStateGateway: Send + Sync {
    /// Brings the interface up (`true`) or down (`false`).
    async fn set_up(&self, interface: &str, up: bool) -> io::Result<()>;

    /// Returns whether the interface is administratively up.
    async fn is_up(&self, interface: &str) -> io::Result<bool>;
}

/// Linux gateway backed by sysfs and `ip link`.
#[derive(Debug, Clone)]
pub struct LinkStateGateway {
    sysfs_root: PathBuf,
    ip_binary: PathBuf,
}

impl LinkStateGateway {
    /// Creates a gateway using `/sys/class/net` and `ip` from `PATH`.
    pub fn new() -> Self {
        Self {
            sysfs_root: PathBuf::from(paths::SYSFS_NET),
            ip_binary: PathBuf::from(paths::IP_BINARY),
        }
    }

    /// Reads interface flags from a different sysfs tree.
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// Uses a different `ip` executable.
    pub fn with_ip_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ip_binary = binary.into();
        self
    }

    /// Reads and parses the flags file of an interface.
    pub async fn flags(&self, interface: &str) -> io::Result<InterfaceFlags> {
        let path = self.sysfs_root.join(interface).join("flags");
        let raw = tokio::fs::read_to_string(&path).await?;
        InterfaceFlags::parse_sysfs(&raw).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unparseable flags in {}: {:?}", path.display(), raw.trim()),
            )
        })
    }
}

impl Default for LinkStateGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InterfaceStateGateway for LinkStateGateway {
    async fn set_up(&self, interface: &str, up: bool) -> io::Result<()> {
        let state = if up { "up" } else { "down" };
        debug!("Setting interface {interface} {state}");

        let output = Command::new(&self.ip_binary)
            .args(["link", "set", "dev", interface, state])
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "ip link set dev {interface} {state} failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    async fn is_up(&self, interface: &str) -> io::Result<bool> {
        Ok(self.flags(interface).await?.is_up())
    }
}
