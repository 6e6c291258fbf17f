//! Config builders for hostapd.
//!
//! This module provides functions to validate access point parameters and
//! serialize them into the `key=value` format hostapd reads at startup.
//!
//! # Available Builders
//!
//! - [`hostapd`] - hostapd config builder (Open, WPA, WPA2)
//!
//! # When to Use These
//!
//! Most users should use the high-level [`ApInterfaceManager`](crate::ApInterfaceManager) API
//! instead of calling these builders directly. These are exposed for advanced use cases
//! such as previewing a config or running hostapd outside this crate.
//!
//! # Examples
//!
//! ```rust
//! use aprs::builders::build_hostapd_config;
//! use aprs::{EncryptionType, HostapdParams};
//! use std::path::Path;
//!
//! let params = HostapdParams::new("foobar", false, 6, EncryptionType::Wpa2, "super secret");
//! let config = build_hostapd_config("wlan0", &params, Path::new("/run/hostapd")).unwrap();
//! assert!(config.contains("ssid2=666f6f626172"));
//! ```

pub mod hostapd;

// Re-export builder functions for convenience
pub use hostapd::{HostapdConfigBuilder, build_hostapd_config};
