//! Constants for hostapd configuration values and kernel interface state.
//!
//! These mirror the limits hostapd and the 802.11 standard place on access
//! point parameters, plus the default locations this crate reads and writes.

/// SSID length limits in bytes.
pub mod ssid {
    pub const MIN_LEN: usize = 1;
    pub const MAX_LEN: usize = 32;
}

/// WPA passphrase limits.
pub mod passphrase {
    /// Shortest ASCII passphrase hostapd accepts for `wpa_passphrase`.
    pub const MIN_LEN: usize = 8;
    /// Longest ASCII passphrase hostapd accepts for `wpa_passphrase`.
    pub const MAX_LEN: usize = 63;
    /// A raw 256-bit PSK written as hex digits.
    pub const PSK_HEX_LEN: usize = 64;
}

/// Legal 802.11 channel numbers.
pub mod channel {
    pub const BAND_2_4_FIRST: u32 = 1;
    pub const BAND_2_4_LAST: u32 = 14;

    /// 5 GHz channels hostapd can run a 20 MHz AP on.
    pub const BAND_5: &[u32] = &[
        36, 40, 44, 48, 52, 56, 60, 64, 100, 104, 108, 112, 116, 120, 124, 128, 132, 136, 140, 144,
        149, 153, 157, 161, 165,
    ];
}

/// Default filesystem locations.
pub mod paths {
    pub const HOSTAPD_BINARY: &str = "/usr/sbin/hostapd";
    pub const HOSTAPD_CONFIG: &str = "/run/aprs/hostapd.conf";
    pub const CTRL_INTERFACE: &str = "/run/hostapd";
    pub const SYSFS_NET: &str = "/sys/class/net";
    pub const IP_BINARY: &str = "ip";
}

/// Default interface to run the access point on.
pub const DEFAULT_INTERFACE: &str = "wlan0";

/// Timeout constants for hostapd supervision.
///
/// Each of these can be overridden through [`TimeoutConfig`](crate::TimeoutConfig).
pub mod timeouts {
    use std::time::Duration;

    /// Maximum time for a freshly launched hostapd to be confirmed running.
    const STARTUP_TIMEOUT_SECS: u64 = 3;

    /// How long hostapd must stay alive after launch before it counts as running.
    ///
    /// hostapd that rejects its config exits almost immediately; probing any
    /// sooner would miss that death.
    const SETTLE_DELAY_MS: u64 = 1000;

    /// Maximum time to wait for hostapd to exit after it was killed.
    const DEATH_TIMEOUT_SECS: u64 = 3;

    /// Maximum time for the kernel to report the interface as up.
    const INTERFACE_TIMEOUT_SECS: u64 = 3;

    /// Interval between liveness probes.
    const POLL_INTERVAL_MS: u64 = 100;

    /// Returns the startup timeout duration.
    pub fn startup_timeout() -> Duration {
        Duration::from_secs(STARTUP_TIMEOUT_SECS)
    }

    /// Returns the settle delay duration.
    pub fn settle_delay() -> Duration {
        Duration::from_millis(SETTLE_DELAY_MS)
    }

    /// Returns the death confirmation timeout.
    pub fn death_timeout() -> Duration {
        Duration::from_secs(DEATH_TIMEOUT_SECS)
    }

    /// Returns the interface up confirmation timeout.
    pub fn interface_timeout() -> Duration {
        Duration::from_secs(INTERFACE_TIMEOUT_SECS)
    }

    /// Returns the liveness poll interval.
    pub fn poll_interval() -> Duration {
        Duration::from_millis(POLL_INTERVAL_MS)
    }
}
