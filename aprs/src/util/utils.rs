//! Utility functions for SSID, channel and passphrase handling.
//!
//! Provides helpers for converting access point parameters into the forms
//! hostapd expects and into something printable for logs.

use log::warn;
use std::borrow::Cow;
use std::fmt::Write;
use std::str;

use crate::api::models::WifiBand;
use crate::types::constants::{channel, passphrase};

/// Maps a channel number to the band it belongs to.
///
/// Supports 2.4GHz (channels 1-14) and the 20 MHz 5GHz channels.
/// Returns `None` for anything hostapd could not run an AP on.
pub(crate) fn band_for_channel(ch: u32) -> Option<WifiBand> {
    match ch {
        channel::BAND_2_4_FIRST..=channel::BAND_2_4_LAST => Some(WifiBand::Bg),
        _ if channel::BAND_5.contains(&ch) => Some(WifiBand::A),
        _ => None,
    }
}

/// Encodes SSID bytes as lowercase hex for hostapd's `ssid2=` key.
///
/// Using the hex form lets any byte sequence through without quoting.
pub(crate) fn ssid_to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Decode SSID bytes for logging, defaulting to `<non-UTF-8 SSID>` if invalid.
pub(crate) fn decode_ssid_for_log(bytes: &[u8]) -> Cow<'_, str> {
    match str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(e) => {
            warn!("Invalid UTF-8 in SSID: {e}");
            Cow::Borrowed("<non-UTF-8 SSID>")
        }
    }
}

/// Whether the bytes form a raw 256-bit PSK (exactly 64 hex digits).
pub(crate) fn is_hex_psk(bytes: &[u8]) -> bool {
    bytes.len() == passphrase::PSK_HEX_LEN && bytes.iter().all(u8::is_ascii_hexdigit)
}

/// Whether every byte is printable ASCII, the only range hostapd accepts
/// for `wpa_passphrase`.
pub(crate) fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| (0x20..=0x7e).contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_for_channel() {
        assert_eq!(band_for_channel(1), Some(WifiBand::Bg));
        assert_eq!(band_for_channel(6), Some(WifiBand::Bg));
        assert_eq!(band_for_channel(14), Some(WifiBand::Bg));
        assert_eq!(band_for_channel(36), Some(WifiBand::A));
        assert_eq!(band_for_channel(165), Some(WifiBand::A));
        assert_eq!(band_for_channel(0), None);
        assert_eq!(band_for_channel(15), None);
        assert_eq!(band_for_channel(37), None);
        assert_eq!(band_for_channel(200), None);
    }

    #[test]
    fn test_ssid_to_hex() {
        assert_eq!(ssid_to_hex(b"foobar"), "666f6f626172");
        assert_eq!(ssid_to_hex(&[0x00, 0xff, 0x0a]), "00ff0a");
        assert_eq!(ssid_to_hex(b""), "");
    }

    #[test]
    fn test_decode_ssid_for_log() {
        assert_eq!(decode_ssid_for_log(b"Cafe"), "Cafe");
        assert_eq!(decode_ssid_for_log(&[0xff, 0xfe]), "<non-UTF-8 SSID>");
    }

    #[test]
    fn test_is_hex_psk() {
        assert!(is_hex_psk("a1".repeat(32).as_bytes()));
        assert!(!is_hex_psk("a1".repeat(31).as_bytes()));
        assert!(!is_hex_psk("zz".repeat(32).as_bytes()));
    }

    #[test]
    fn test_is_printable_ascii() {
        assert!(is_printable_ascii(b"super secret"));
        assert!(!is_printable_ascii(b"line\nbreak"));
        assert!(!is_printable_ascii("caf\u{e9}".as_bytes()));
    }
}
