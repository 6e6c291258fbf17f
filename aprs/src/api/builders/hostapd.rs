//! hostapd config builder with type-safe API.
//!
//! Validates access point parameters and renders them as a hostapd config
//! file. Nothing here touches the filesystem; writing is done by the
//! manager only after a config has been built successfully.
//!
//! # Output Structure
//!
//! The rendered file is a flat list of `key=value` lines:
//! - `interface`, `driver`, `ctrl_interface`: where hostapd runs
//! - `ssid2`: the SSID as hex, so arbitrary bytes survive
//! - `channel`, `hw_mode`, `ieee80211n`: radio settings
//! - `ignore_broadcast_ssid`: hidden network flag
//! - `wpa`, `*_pairwise`, `wpa_passphrase`/`wpa_psk`: security, absent for open networks

use log::debug;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::api::models::{EncryptionType, HostapdParams, ValidationError, WifiBand};
use crate::types::constants::{passphrase, paths, ssid};
use crate::util::utils::{band_for_channel, is_hex_psk, is_printable_ascii, ssid_to_hex};

/// Channel used when none is set.
const DEFAULT_CHANNEL: u32 = 6;

/// Builds a complete hostapd config for the given interface.
///
/// # Errors
///
/// - `ValidationError::EmptySsid` / `SsidTooLong` if the SSID is not 1-32 bytes
/// - `ValidationError::InvalidChannel` if the channel is not a legal AP channel
/// - `ValidationError::PassphraseLength` / `PassphraseCharacters` for a bad
///   WPA passphrase
pub fn build_hostapd_config(
    interface: &str,
    params: &HostapdParams,
    ctrl_interface: &Path,
) -> Result<String, ValidationError> {
    HostapdConfigBuilder::from_params(interface, params)
        .ctrl_interface(ctrl_interface)
        .build()
}

/// Builder for hostapd configs.
///
/// # Examples
///
/// ## Open Network
///
/// ```rust
/// use aprs::builders::HostapdConfigBuilder;
///
/// let config = HostapdConfigBuilder::new("wlan0", "CoffeeShop")
///     .channel(11)
///     .open()
///     .build()
///     .unwrap();
/// assert!(!config.contains("wpa="));
/// ```
///
/// ## WPA2 Hidden Network
///
/// ```rust
/// use aprs::builders::HostapdConfigBuilder;
///
/// let config = HostapdConfigBuilder::new("wlan0", "HomeNetwork")
///     .channel(36)
///     .hidden(true)
///     .wpa2("my_secure_password")
///     .build()
///     .unwrap();
/// assert!(config.contains("hw_mode=a"));
/// assert!(config.contains("ignore_broadcast_ssid=1"));
/// ```
#[derive(Clone)]
pub struct HostapdConfigBuilder {
    interface: String,
    ctrl_interface: PathBuf,
    ssid: Vec<u8>,
    hidden: bool,
    channel: u32,
    encryption: EncryptionType,
    passphrase: Vec<u8>,
}

impl HostapdConfigBuilder {
    /// Creates a builder for an open network on channel 6.
    pub fn new(interface: impl Into<String>, ssid: impl Into<Vec<u8>>) -> Self {
        Self {
            interface: interface.into(),
            ctrl_interface: PathBuf::from(paths::CTRL_INTERFACE),
            ssid: ssid.into(),
            hidden: false,
            channel: DEFAULT_CHANNEL,
            encryption: EncryptionType::Open,
            passphrase: Vec::new(),
        }
    }

    /// Creates a builder pre-filled from caller parameters.
    pub fn from_params(interface: impl Into<String>, params: &HostapdParams) -> Self {
        Self {
            hidden: params.hidden,
            channel: params.channel,
            encryption: params.encryption,
            passphrase: params.passphrase.clone(),
            ..Self::new(interface, params.ssid.clone())
        }
    }

    /// Sets the directory hostapd creates its control socket in.
    pub fn ctrl_interface(mut self, path: impl Into<PathBuf>) -> Self {
        self.ctrl_interface = path.into();
        self
    }

    /// Hides the SSID from beacons.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Sets the channel. The band follows from it.
    pub fn channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    /// Configures an open (unsecured) network.
    pub fn open(mut self) -> Self {
        self.encryption = EncryptionType::Open;
        self.passphrase.clear();
        self
    }

    /// Configures WPA/WPA2 mixed mode with the given passphrase.
    pub fn wpa(mut self, passphrase: impl Into<Vec<u8>>) -> Self {
        self.encryption = EncryptionType::Wpa;
        self.passphrase = passphrase.into();
        self
    }

    /// Configures WPA2-PSK (CCMP) with the given passphrase.
    pub fn wpa2(mut self, passphrase: impl Into<Vec<u8>>) -> Self {
        self.encryption = EncryptionType::Wpa2;
        self.passphrase = passphrase.into();
        self
    }

    /// Checks every field without rendering anything.
    ///
    /// Returns the band the channel belongs to.
    pub fn validate(&self) -> Result<WifiBand, ValidationError> {
        if self.ssid.len() < ssid::MIN_LEN {
            return Err(ValidationError::EmptySsid);
        }
        if self.ssid.len() > ssid::MAX_LEN {
            return Err(ValidationError::SsidTooLong(self.ssid.len()));
        }

        let band =
            band_for_channel(self.channel).ok_or(ValidationError::InvalidChannel(self.channel))?;

        if self.encryption.secured() {
            validate_passphrase(&self.passphrase)?;
        } else if !self.passphrase.is_empty() {
            debug!("Ignoring passphrase for open network");
        }

        Ok(band)
    }

    /// Validates and renders the config.
    pub fn build(self) -> Result<String, ValidationError> {
        let band = self.validate()?;

        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "interface={}", self.interface);
        let _ = writeln!(out, "driver=nl80211");
        let _ = writeln!(out, "ctrl_interface={}", self.ctrl_interface.display());
        let _ = writeln!(out, "ssid2={}", ssid_to_hex(&self.ssid));
        let _ = writeln!(out, "channel={}", self.channel);
        let _ = writeln!(out, "ieee80211n=1");
        let _ = writeln!(out, "hw_mode={}", band.hw_mode());
        let _ = writeln!(out, "ignore_broadcast_ssid={}", u8::from(self.hidden));
        let _ = writeln!(out, "wowlan_triggers=any");

        match self.encryption {
            EncryptionType::Open => {}
            EncryptionType::Wpa => {
                let _ = writeln!(out, "wpa=3");
                let _ = writeln!(out, "wpa_pairwise=TKIP CCMP");
                let _ = writeln!(out, "rsn_pairwise=CCMP");
                write_psk(&mut out, &self.passphrase);
            }
            EncryptionType::Wpa2 => {
                let _ = writeln!(out, "wpa=2");
                let _ = writeln!(out, "rsn_pairwise=CCMP");
                write_psk(&mut out, &self.passphrase);
            }
        }

        Ok(out)
    }
}

fn validate_passphrase(bytes: &[u8]) -> Result<(), ValidationError> {
    if is_hex_psk(bytes) {
        return Ok(());
    }
    if !(passphrase::MIN_LEN..=passphrase::MAX_LEN).contains(&bytes.len()) {
        return Err(ValidationError::PassphraseLength(bytes.len()));
    }
    if !is_printable_ascii(bytes) {
        return Err(ValidationError::PassphraseCharacters);
    }
    Ok(())
}

fn write_psk(out: &mut String, bytes: &[u8]) {
    // Validated as ASCII already
    let text = String::from_utf8_lossy(bytes);
    if is_hex_psk(bytes) {
        let _ = writeln!(out, "wpa_psk={text}");
    } else {
        let _ = writeln!(out, "wpa_passphrase={text}");
    }
}
