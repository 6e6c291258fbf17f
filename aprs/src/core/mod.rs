//! Core internal logic for access point management.
//!
//! This module contains the interface state gateway, process primitives,
//! the hostapd supervisor and the bounded waits it relies on.

pub(crate) mod config_file;
pub(crate) mod interface_state;
pub(crate) mod process;
pub(crate) mod state_wait;
pub(crate) mod supervisor;
