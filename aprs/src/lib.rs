//! A Rust library for running a Wi-Fi access point interface under hostapd.
//!
//! This crate provides a high-level async API for the access point lifecycle:
//!
//! - Claiming the single AP interface and releasing it again
//! - Validating access point parameters and writing the hostapd config
//! - Starting and stopping hostapd, keeping the interface up exactly while
//!   hostapd is running
//!
//! # Example
//!
//! ```no_run
//! use aprs::{ApInterfaceManager, EncryptionType, HostapdParams};
//!
//! # async fn example() -> aprs::Result<()> {
//! let manager = ApInterfaceManager::new();
//! let ap = manager.create_ap_interface().await?;
//!
//! manager
//!     .write_hostapd_config(
//!         &ap,
//!         &HostapdParams::new("foobar", false, 6, EncryptionType::Wpa2, "super secret"),
//!     )
//!     .await?;
//! manager.start_hostapd(&ap).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, ApError>`. [`ApError::is_rejection`]
//! separates domain-level failures (invalid SSID, hostapd refusing to start)
//! from precondition and I/O failures. [`ApInterfaceService`] turns that
//! distinction into the three-way [`Reply`] type used by remote callers.
//!
//! # Process Supervision
//!
//! hostapd gives no readiness signal, so startup is confirmed by polling: the
//! process must stay alive through a settle delay before the interface is
//! brought up. A hostapd that dies right after that window is only noticed on
//! the next observation ([`ApInterfaceManager::refresh`]). All durations are
//! configurable through [`TimeoutConfig`].
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:
//!
//! ```ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod core;
mod types;
mod util;

// Public API modules
pub mod api;

// Re-exported public API
pub use api::builders;
pub use api::models::{
    ApConfig, ApError, ApStatus, EncryptionType, HostapdParams, HostapdState, InterfaceHandle,
    TimeoutConfig, ValidationError, WifiBand,
};
pub use api::{ap_manager::ApInterfaceManager, service::ApInterfaceService, service::Reply};
pub use crate::core::interface_state::{InterfaceStateGateway, LinkStateGateway};
pub use crate::core::process::{CommandLauncher, HostapdProcess, ProcessLauncher, ProcessStatus};
pub use types::interface_flags::InterfaceFlags;

/// A specialized `Result` type for access point operations.
pub type Result<T> = std::result::Result<T, ApError>;
