//! Type definitions and constants.
//!
//! This module contains hostapd limits, default paths and timeouts.

pub(crate) mod constants;
pub(crate) mod interface_flags;
