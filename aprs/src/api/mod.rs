//! Public API module.
//!
//! This module contains the high-level user-facing API for the `aprs` crate.

pub mod ap_manager;
pub mod builders;
pub mod models;
pub mod service;
