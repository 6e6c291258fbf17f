//! Request-facing surface over [`ApInterfaceManager`].
//!
//! Remote callers need to tell three outcomes apart: the request could not be
//! carried out at all, it was carried out but the answer is "no" (bad SSID,
//! hostapd refused to start), or it succeeded. [`Reply`] keeps those apart
//! instead of returning a pair of booleans.

use log::debug;

use crate::Result;
use crate::api::ap_manager::ApInterfaceManager;
use crate::api::models::{ApError, HostapdParams, InterfaceHandle};

/// Outcome of a service request.
#[derive(Debug)]
pub enum Reply<T> {
    /// The request succeeded.
    Success(T),
    /// The request was carried out but the domain answer is negative.
    /// The caller may retry with different input.
    Rejected(ApError),
    /// A precondition or I/O failure stopped the request.
    Failed(ApError),
}

impl<T> Reply<T> {
    /// Transport/precondition success: `true` unless the reply is `Failed`.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Domain success: `true` only for `Success`.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the success value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error behind a `Rejected` or `Failed` reply.
    pub fn error(&self) -> Option<&ApError> {
        match self {
            Self::Success(_) => None,
            Self::Rejected(e) | Self::Failed(e) => Some(e),
        }
    }

    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) if e.is_rejection() => {
                debug!("Request rejected: {e}");
                Self::Rejected(e)
            }
            Err(e) => {
                debug!("Request failed: {e}");
                Self::Failed(e)
            }
        }
    }
}

/// The operations exposed to remote callers.
///
/// # Example
///
/// ```no_run
/// use aprs::{ApInterfaceService, EncryptionType, HostapdParams, Reply};
///
/// # async fn example() {
/// let service = ApInterfaceService::default();
///
/// let Reply::Success(Some(handle)) = service.create_ap_interface().await else {
///     return;
/// };
///
/// let params = HostapdParams::new(vec![b'x'; 33], false, 6, EncryptionType::Wpa2, "super secret");
/// let reply = service.write_hostapd_config(&handle, &params).await;
/// assert!(reply.is_ok());
/// assert!(!reply.succeeded());
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ApInterfaceService {
    manager: ApInterfaceManager,
}

impl ApInterfaceService {
    pub fn new(manager: ApInterfaceManager) -> Self {
        Self { manager }
    }

    /// Returns the underlying manager.
    pub fn manager(&self) -> &ApInterfaceManager {
        &self.manager
    }

    /// Creates the AP interface.
    ///
    /// A second call while one exists succeeds with `None`.
    pub async fn create_ap_interface(&self) -> Reply<Option<InterfaceHandle>> {
        match self.manager.create_ap_interface().await {
            Ok(handle) => Reply::Success(Some(handle)),
            Err(ApError::AlreadyExists(_)) => Reply::Success(None),
            Err(e) => Reply::from_result(Err(e)),
        }
    }

    pub async fn get_interface_name(&self, handle: &InterfaceHandle) -> Reply<String> {
        Reply::from_result(self.manager.interface_name(handle).await)
    }

    /// `Success` means "wrote", `Rejected` means invalid parameters.
    pub async fn write_hostapd_config(
        &self,
        handle: &InterfaceHandle,
        params: &HostapdParams,
    ) -> Reply<()> {
        Reply::from_result(self.manager.write_hostapd_config(handle, params).await)
    }

    /// `Success` means "started", `Rejected` means hostapd did not come up.
    pub async fn start_hostapd(&self, handle: &InterfaceHandle) -> Reply<()> {
        Reply::from_result(self.manager.start_hostapd(handle).await)
    }

    /// `Success` means "stopped".
    pub async fn stop_hostapd(&self, handle: &InterfaceHandle) -> Reply<()> {
        Reply::from_result(self.manager.stop_hostapd(handle).await)
    }

    pub async fn tear_down_interfaces(&self) -> Reply<()> {
        Reply::from_result(self.manager.tear_down_interfaces().await)
    }
}
