//! Kernel network interface flags as reported by `/sys/class/net/<if>/flags`.

use bitflags::bitflags;

bitflags! {
    /// `IFF_*` flags from `<linux/if.h>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterfaceFlags: u32 {
        /// Interface is administratively up.
        const UP = 0x0001;
        /// Broadcast address valid.
        const BROADCAST = 0x0002;
        /// Loopback interface.
        const LOOPBACK = 0x0008;
        /// Point-to-point link.
        const POINTOPOINT = 0x0010;
        /// Resources allocated.
        const RUNNING = 0x0040;
        /// No ARP protocol.
        const NOARP = 0x0080;
        /// Receives all packets.
        const PROMISC = 0x0100;
        /// Supports multicast.
        const MULTICAST = 0x1000;
    }
}

impl InterfaceFlags {
    /// Parses the hex string sysfs exposes, e.g. `0x1003`.
    ///
    /// Unknown bits are kept so the raw value round-trips.
    pub fn parse_sysfs(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u32::from_str_radix(digits, 16)
            .ok()
            .map(Self::from_bits_retain)
    }

    /// Whether the administrative up bit is set.
    pub fn is_up(&self) -> bool {
        self.contains(Self::UP)
    }
}
