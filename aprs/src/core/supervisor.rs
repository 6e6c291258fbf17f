//! hostapd process supervision.
//!
//! [`HostapdProcessSupervisor`] owns at most one hostapd child for one
//! interface and keeps the interface's administrative state in step with
//! it. hostapd does not bring the interface up by itself, so the supervisor
//! drives it up once hostapd is confirmed running and down whenever hostapd
//! stops, fails to start, or is found dead.
//!
//! # State Machine
//!
//! ```text
//!  Stopped --start()--> Starting --probe ok, iface up--> Running
//!     ^                    |                                |
//!     +---- failure -------+                             stop()
//!     |                                                     v
//!     +------------------------------------------------ Stopping
//! ```
//!
//! Every transition is published on a `watch` channel so status readers never
//! need the lock that serialises start and stop.

use log::{debug, info, warn};
use std::ffi::OsString;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::Result;
use crate::api::models::{ApConfig, ApError, HostapdState};
use crate::core::interface_state::InterfaceStateGateway;
use crate::core::process::{HostapdProcess, ProcessLauncher, ProcessStatus};
use crate::core::state_wait::{
    wait_for_hostapd_exit, wait_for_hostapd_running, wait_for_interface_up,
};

pub(crate) struct HostapdProcessSupervisor {
    interface: String,
    config: Arc<ApConfig>,
    gateway: Arc<dyn InterfaceStateGateway>,
    launcher: Arc<dyn ProcessLauncher>,
    process: Option<Box<dyn HostapdProcess>>,
    state: watch::Sender<HostapdState>,
    retired: bool,
}

impl HostapdProcessSupervisor {
    pub(crate) fn new(
        interface: impl Into<String>,
        config: Arc<ApConfig>,
        gateway: Arc<dyn InterfaceStateGateway>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        let (state, _) = watch::channel(HostapdState::Stopped);
        Self {
            interface: interface.into(),
            config,
            gateway,
            launcher,
            process: None,
            state,
            retired: false,
        }
    }

    /// Returns a receiver that observes every state transition.
    pub(crate) fn subscribe(&self) -> watch::Receiver<HostapdState> {
        self.state.subscribe()
    }

    pub(crate) fn state(&self) -> HostapdState {
        *self.state.borrow()
    }

    /// Whether the owning interface has been torn down.
    pub(crate) fn is_retired(&self) -> bool {
        self.retired
    }

    /// Marks the owning interface as torn down. Later starts fail.
    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    /// Launches hostapd and brings the interface up.
    ///
    /// On any failure the child is killed, the interface is forced down and
    /// the supervisor is back in `Stopped` before the error is returned.
    pub(crate) async fn start(&mut self) -> Result<()> {
        if self.retired {
            return Err(ApError::NoInterface);
        }

        if self.refresh().await? == HostapdState::Running {
            debug!("hostapd already running on {}", self.interface);
            return Ok(());
        }

        let config_path = &self.config.config_path;
        let exists = tokio::fs::try_exists(config_path)
            .await
            .map_err(|e| ApError::ConfigAccess {
                path: config_path.clone(),
                source: e,
            })?;
        if !exists {
            return Err(ApError::NoConfig);
        }

        let mut args: Vec<OsString> = self.config.hostapd_args.iter().map(OsString::from).collect();
        args.push(config_path.as_os_str().to_owned());

        self.set_state(HostapdState::Starting);
        let launched_at = Instant::now();
        let process = match self.launcher.launch(&self.config.hostapd_binary, &args) {
            Ok(p) => p,
            Err(e) => {
                self.set_state(HostapdState::Stopped);
                return Err(ApError::Process {
                    context: format!("spawning {}", self.config.hostapd_binary.display()),
                    source: e,
                });
            }
        };
        info!(
            "Launched hostapd (pid {:?}) for {}",
            process.id(),
            self.interface
        );
        self.process = Some(process);

        match self.bring_up(launched_at).await {
            Ok(()) => {
                self.set_state(HostapdState::Running);
                info!("hostapd running on {}", self.interface);
                Ok(())
            }
            Err(e) => {
                warn!("hostapd failed to start on {}: {e}", self.interface);
                self.abort_start().await;
                Err(e)
            }
        }
    }

    /// Kills hostapd and brings the interface down.
    ///
    /// Succeeds once the kill was requested and the interface is down, even if
    /// the exit could not be confirmed in time. With nothing running it only
    /// forces the interface down, so calling it repeatedly is safe.
    pub(crate) async fn stop(&mut self) -> Result<()> {
        let Some(mut process) = self.process.take() else {
            self.set_state(HostapdState::Stopped);
            return set_interface_up(self.gateway.as_ref(), &self.interface, false).await;
        };

        self.set_state(HostapdState::Stopping);
        info!("Stopping hostapd (pid {:?}) on {}", process.id(), self.interface);

        if let Err(e) = process.start_kill() {
            warn!("Failed to signal hostapd: {e}");
        }
        let down = set_interface_up(self.gateway.as_ref(), &self.interface, false).await;

        if !wait_for_hostapd_exit(process.as_mut(), &self.config.timeouts).await {
            warn!("hostapd exit not confirmed, dropping handle");
        }
        drop(process);

        self.set_state(HostapdState::Stopped);
        down
    }

    /// Re-observes the process and degrades to `Stopped` if it died on its own.
    pub(crate) async fn refresh(&mut self) -> Result<HostapdState> {
        let status = match self.process.as_mut() {
            Some(process) => process.try_status().map_err(|e| ApError::Process {
                context: "probing liveness".to_string(),
                source: e,
            })?,
            None => return Ok(self.state()),
        };

        if let ProcessStatus::Exited(code) = status {
            warn!(
                "hostapd on {} exited unexpectedly with status {code:?}",
                self.interface
            );
            self.process = None;
            self.set_state(HostapdState::Stopped);
            set_interface_up(self.gateway.as_ref(), &self.interface, false).await?;
        }
        Ok(self.state())
    }

    async fn bring_up(&mut self, launched_at: Instant) -> Result<()> {
        let process = self
            .process
            .as_deref_mut()
            .ok_or(ApError::ProcessExited(None))?;
        wait_for_hostapd_running(process, launched_at, &self.config.timeouts).await?;

        set_interface_up(self.gateway.as_ref(), &self.interface, true).await?;
        wait_for_interface_up(self.gateway.as_ref(), &self.interface, &self.config.timeouts).await
    }

    async fn abort_start(&mut self) {
        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.start_kill() {
                warn!("Failed to kill hostapd after failed start: {e}");
            }
            wait_for_hostapd_exit(process.as_mut(), &self.config.timeouts).await;
        }
        if let Err(e) = set_interface_up(self.gateway.as_ref(), &self.interface, false).await {
            warn!("Failed to force {} down after failed start: {e}", self.interface);
        }
        self.set_state(HostapdState::Stopped);
    }

    fn set_state(&self, state: HostapdState) {
        let old = self.state.send_replace(state);
        if old != state {
            debug!("hostapd on {}: {old} -> {state}", self.interface);
        }
    }
}

async fn set_interface_up(
    gateway: &dyn InterfaceStateGateway,
    interface: &str,
    up: bool,
) -> Result<()> {
    gateway
        .set_up(interface, up)
        .await
        .map_err(|e| ApError::InterfaceState {
            interface: interface.to_string(),
            source: e,
        })
}
