//! Bounded waits for hostapd and interface state.
//!
//! Neither hostapd nor the kernel tell us when they are ready, so these
//! functions poll. Every wait races the poll loop against a timeout delay
//! (runtime-agnostic, via `futures-timer`) and degrades to an error instead
//! of hanging.
//!
//! # Known Race
//!
//! A hostapd that rejects its config exits shortly after launch. A probe that
//! runs before that exit sees a live process. [`wait_for_hostapd_running`]
//! therefore only accepts a process that has stayed alive for the whole
//! settle delay. This narrows the window; it does not close it. A hostapd
//! that dies after the settle delay is reported as running until the next
//! observation.

use futures::{FutureExt, select};
use futures_timer::Delay;
use log::{debug, warn};
use std::pin::pin;
use std::time::{Duration, Instant};

use crate::Result;
use crate::api::models::{ApError, TimeoutConfig};
use crate::core::interface_state::InterfaceStateGateway;
use crate::core::process::{HostapdProcess, ProcessStatus};

/// Polls until the process has survived the settle delay.
///
/// Returns `ProcessExited` as soon as the process is seen dead, or
/// `StartupTimeout` if the settle delay cannot be reached within the
/// startup timeout.
pub(crate) async fn wait_for_hostapd_running(
    process: &mut dyn HostapdProcess,
    launched_at: Instant,
    timeouts: &TimeoutConfig,
) -> Result<()> {
    let mut timeout_delay = pin!(Delay::new(timeouts.startup_timeout).fuse());

    loop {
        match probe(process)? {
            ProcessStatus::Exited(code) => {
                warn!("hostapd exited during startup with status {code:?}");
                return Err(ApError::ProcessExited(code));
            }
            ProcessStatus::Running if launched_at.elapsed() >= timeouts.settle_delay => {
                debug!("hostapd alive after {:?}", launched_at.elapsed());
                return Ok(());
            }
            ProcessStatus::Running => {}
        }

        let mut tick = pin!(Delay::new(next_tick(launched_at, timeouts)).fuse());
        select! {
            _ = timeout_delay => {
                warn!("hostapd not confirmed running after {:?}", timeouts.startup_timeout);
                return Err(ApError::StartupTimeout(timeouts.startup_timeout));
            }
            _ = tick => {}
        }
    }
}

/// Polls the gateway until the interface reports up.
pub(crate) async fn wait_for_interface_up(
    gateway: &dyn InterfaceStateGateway,
    interface: &str,
    timeouts: &TimeoutConfig,
) -> Result<()> {
    let mut timeout_delay = pin!(Delay::new(timeouts.interface_timeout).fuse());

    loop {
        if is_up(gateway, interface).await? {
            debug!("Interface {interface} is up");
            return Ok(());
        }

        let mut tick = pin!(Delay::new(timeouts.effective_poll_interval()).fuse());
        select! {
            _ = timeout_delay => {
                // Check final state - might have come up during the last moments
                if is_up(gateway, interface).await? {
                    return Ok(());
                }
                warn!("Interface {interface} not up after {:?}", timeouts.interface_timeout);
                return Err(ApError::InterfaceNotUp(interface.to_string()));
            }
            _ = tick => {}
        }
    }
}

/// Polls until the process has exited.
///
/// Returns `false` if it was still running when the death timeout expired.
/// Exit confirmation is best-effort, so probe errors count as "not confirmed".
pub(crate) async fn wait_for_hostapd_exit(
    process: &mut dyn HostapdProcess,
    timeouts: &TimeoutConfig,
) -> bool {
    let mut timeout_delay = pin!(Delay::new(timeouts.death_timeout).fuse());

    loop {
        match process.try_status() {
            Ok(ProcessStatus::Exited(code)) => {
                debug!("hostapd exited with status {code:?}");
                return true;
            }
            Ok(ProcessStatus::Running) => {}
            Err(e) => {
                warn!("Failed to probe hostapd while waiting for exit: {e}");
                return false;
            }
        }

        let mut tick = pin!(Delay::new(timeouts.effective_poll_interval()).fuse());
        select! {
            _ = timeout_delay => {
                warn!("hostapd still running {:?} after kill", timeouts.death_timeout);
                return false;
            }
            _ = tick => {}
        }
    }
}

fn probe(process: &mut dyn HostapdProcess) -> Result<ProcessStatus> {
    process.try_status().map_err(|e| ApError::Process {
        context: "probing liveness".to_string(),
        source: e,
    })
}

async fn is_up(gateway: &dyn InterfaceStateGateway, interface: &str) -> Result<bool> {
    gateway
        .is_up(interface)
        .await
        .map_err(|e| ApError::InterfaceState {
            interface: interface.to_string(),
            source: e,
        })
}

/// Sleep until the next poll, but never past the end of the settle delay.
fn next_tick(launched_at: Instant, timeouts: &TimeoutConfig) -> Duration {
    let until_settled = timeouts.settle_delay.saturating_sub(launched_at.elapsed());
    if until_settled.is_zero() {
        timeouts.effective_poll_interval()
    } else {
        until_settled.min(timeouts.effective_poll_interval())
    }
}
