use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::Result;
use crate::api::builders::build_hostapd_config;
use crate::api::models::{
    ApConfig, ApError, ApStatus, HostapdParams, HostapdState, InterfaceHandle,
};
use crate::core::config_file::write_config_file;
use crate::core::interface_state::{InterfaceStateGateway, LinkStateGateway};
use crate::core::process::{CommandLauncher, ProcessLauncher};
use crate::core::supervisor::HostapdProcessSupervisor;
use crate::util::utils::decode_ssid_for_log;

/// High-level interface to the host's access point interface.
///
/// This is the main entry point. It owns the single AP interface slot and
/// the hostapd process running on it.
///
/// # Creating an Instance
///
/// ```no_run
/// use aprs::{ApConfig, ApInterfaceManager};
///
/// let manager = ApInterfaceManager::with_config(ApConfig::default().with_interface("wlan1"));
/// ```
///
/// # Examples
///
/// ## Running an Access Point
///
/// ```no_run
/// use aprs::{ApInterfaceManager, EncryptionType, HostapdParams};
///
/// # async fn example() -> aprs::Result<()> {
/// let manager = ApInterfaceManager::new();
///
/// let handle = manager.create_ap_interface().await?;
/// manager
///     .write_hostapd_config(
///         &handle,
///         &HostapdParams::new("foobar", false, 6, EncryptionType::Wpa2, "super secret"),
///     )
///     .await?;
///
/// manager.start_hostapd(&handle).await?;
/// assert!(manager.is_interface_up(&handle).await?);
///
/// manager.stop_hostapd(&handle).await?;
/// manager.tear_down_interfaces().await?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// `ApInterfaceManager` is `Clone` and can be shared across async tasks.
/// Each clone shares the same interface slot. Creation and tear-down are
/// serialised, and start/stop on an interface never interleave. Status
/// queries do not wait for a start or stop in progress.
#[derive(Clone)]
pub struct ApInterfaceManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: Arc<ApConfig>,
    gateway: Arc<dyn InterfaceStateGateway>,
    launcher: Arc<dyn ProcessLauncher>,
    lifecycle: Mutex<()>,
    current: RwLock<Option<Arc<ApInterface>>>,
}

struct ApInterface {
    handle: InterfaceHandle,
    created_at: SystemTime,
    config_written: AtomicBool,
    state: watch::Receiver<HostapdState>,
    supervisor: Mutex<HostapdProcessSupervisor>,
}

impl ApInterfaceManager {
    /// Creates a manager with the default configuration, sysfs/`ip link`
    /// interface control and real hostapd processes.
    pub fn new() -> Self {
        Self::with_config(ApConfig::default())
    }

    /// Creates a manager with a custom configuration.
    pub fn with_config(config: ApConfig) -> Self {
        Self::with_backends(
            config,
            Arc::new(LinkStateGateway::new()),
            Arc::new(CommandLauncher::new()),
        )
    }

    /// Creates a manager with injected interface and process backends.
    pub fn with_backends(
        config: ApConfig,
        gateway: Arc<dyn InterfaceStateGateway>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: Arc::new(config),
                gateway,
                launcher,
                lifecycle: Mutex::new(()),
                current: RwLock::new(None),
            }),
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &ApConfig {
        &self.inner.config
    }

    /// Claims the AP interface.
    ///
    /// The interface is forced down before the handle is returned; it only
    /// comes up once hostapd is running.
    ///
    /// # Errors
    ///
    /// Returns `ApError::AlreadyExists` if an interface is already live.
    pub async fn create_ap_interface(&self) -> Result<InterfaceHandle> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        if let Some(existing) = self.inner.current.read().await.as_ref() {
            debug!("Refusing second AP interface, {} exists", existing.handle);
            return Err(ApError::AlreadyExists(existing.handle.name.clone()));
        }

        let name = self.inner.config.interface.clone();
        self.inner
            .gateway
            .set_up(&name, false)
            .await
            .map_err(|e| ApError::InterfaceState {
                interface: name.clone(),
                source: e,
            })?;

        let handle = InterfaceHandle {
            id: Uuid::new_v4(),
            name: name.clone(),
        };
        let supervisor = HostapdProcessSupervisor::new(
            name,
            self.inner.config.clone(),
            self.inner.gateway.clone(),
            self.inner.launcher.clone(),
        );
        let iface = ApInterface {
            handle: handle.clone(),
            created_at: SystemTime::now(),
            config_written: AtomicBool::new(false),
            state: supervisor.subscribe(),
            supervisor: Mutex::new(supervisor),
        };

        *self.inner.current.write().await = Some(Arc::new(iface));
        info!("Created AP interface {handle}");
        Ok(handle)
    }

    /// Tears down the AP interface, if any.
    ///
    /// Stops hostapd, forces the interface down and frees the slot. With no
    /// interface this does nothing and succeeds. The slot is freed even if
    /// forcing the interface down fails; that error is still returned.
    pub async fn tear_down_interfaces(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        let Some(iface) = self.inner.current.write().await.take() else {
            debug!("No AP interface to tear down");
            return Ok(());
        };

        let mut supervisor = iface.supervisor.lock().await;
        supervisor.retire();
        let stopped = supervisor.stop().await;
        drop(supervisor);

        info!("Tore down AP interface {}", iface.handle);
        stopped
    }

    /// Returns the kernel name of the interface.
    pub async fn interface_name(&self, handle: &InterfaceHandle) -> Result<String> {
        Ok(self.resolve(handle).await?.handle.name.clone())
    }

    /// Validates `params` and writes the hostapd config.
    ///
    /// The file is replaced atomically. Invalid parameters leave any
    /// existing config untouched.
    ///
    /// # Errors
    ///
    /// Returns `ApError::Validation` for bad parameters, or
    /// `ApError::ConfigWrite` if the file could not be written.
    pub async fn write_hostapd_config(
        &self,
        handle: &InterfaceHandle,
        params: &HostapdParams,
    ) -> Result<()> {
        let iface = self.resolve(handle).await?;
        let config = &self.inner.config;
        let text = build_hostapd_config(&iface.handle.name, params, &config.ctrl_interface)?;

        let supervisor = iface.supervisor.lock().await;
        if supervisor.is_retired() {
            return Err(ApError::NoInterface);
        }
        write_config_file(&config.config_path, &text)
            .await
            .map_err(|e| ApError::ConfigWrite {
                path: config.config_path.clone(),
                source: e,
            })?;
        iface.config_written.store(true, Ordering::SeqCst);
        drop(supervisor);

        info!(
            "Wrote hostapd config for SSID {:?} ({}, channel {}) on {}",
            decode_ssid_for_log(&params.ssid),
            params.encryption,
            params.channel,
            iface.handle.name
        );
        Ok(())
    }

    /// Starts hostapd and waits until it is running and the interface is up.
    ///
    /// Starting while hostapd is already running is a no-op.
    ///
    /// # Errors
    ///
    /// - `ApError::NoConfig` if no config has been written
    /// - `ApError::ProcessExited`, `StartupTimeout` or `InterfaceNotUp` if
    ///   hostapd did not come up; it has been killed and the interface is down
    pub async fn start_hostapd(&self, handle: &InterfaceHandle) -> Result<()> {
        let iface = self.resolve(handle).await?;
        let mut supervisor = iface.supervisor.lock().await;
        if !iface.config_written.load(Ordering::SeqCst) {
            return Err(ApError::NoConfig);
        }
        supervisor.start().await
    }

    /// Stops hostapd and brings the interface down. Safe to call repeatedly.
    pub async fn stop_hostapd(&self, handle: &InterfaceHandle) -> Result<()> {
        let iface = self.resolve(handle).await?;
        let mut supervisor = iface.supervisor.lock().await;
        if supervisor.is_retired() {
            return Err(ApError::NoInterface);
        }
        supervisor.stop().await
    }

    /// Returns the last published hostapd state without waiting on a
    /// start or stop in progress.
    pub async fn hostapd_state(&self, handle: &InterfaceHandle) -> Result<HostapdState> {
        let iface = self.resolve(handle).await?;
        let state = *iface.state.borrow();
        Ok(state)
    }

    /// Re-checks whether hostapd is still alive.
    ///
    /// A hostapd that died on its own is reaped, the interface is forced
    /// down and the state becomes `Stopped`.
    pub async fn refresh(&self, handle: &InterfaceHandle) -> Result<HostapdState> {
        let iface = self.resolve(handle).await?;
        let mut supervisor = iface.supervisor.lock().await;
        supervisor.refresh().await
    }

    /// Subscribes to hostapd state transitions.
    pub async fn subscribe(
        &self,
        handle: &InterfaceHandle,
    ) -> Result<watch::Receiver<HostapdState>> {
        Ok(self.resolve(handle).await?.state.clone())
    }

    /// Asks the kernel whether the interface is administratively up.
    pub async fn is_interface_up(&self, handle: &InterfaceHandle) -> Result<bool> {
        let iface = self.resolve(handle).await?;
        let name = &iface.handle.name;
        self.inner
            .gateway
            .is_up(name)
            .await
            .map_err(|e| ApError::InterfaceState {
                interface: name.clone(),
                source: e,
            })
    }

    /// Returns a snapshot of the interface, or `None` if there is none.
    pub async fn status(&self) -> Option<ApStatus> {
        let current = self.inner.current.read().await;
        current.as_ref().map(|iface| ApStatus {
            handle: iface.handle.clone(),
            created_at: iface.created_at,
            hostapd: *iface.state.borrow(),
            config_written: iface.config_written.load(Ordering::SeqCst),
        })
    }

    async fn resolve(&self, handle: &InterfaceHandle) -> Result<Arc<ApInterface>> {
        let current = self.inner.current.read().await;
        match current.as_ref() {
            None => Err(ApError::NoInterface),
            Some(iface) if iface.handle.id != handle.id => Err(ApError::StaleHandle),
            Some(iface) => Ok(iface.clone()),
        }
    }
}

impl Default for ApInterfaceManager {
    fn default() -> Self {
        Self::new()
    }
}
