//! In-memory interface and process backends for integration tests.

#![allow(dead_code)]

use aprs::{
    ApConfig, ApInterfaceManager, ApInterfaceService, HostapdProcess, InterfaceStateGateway,
    ProcessLauncher, ProcessStatus, TimeoutConfig,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const IFACE: &str = "wlan0";

/// Interface states kept in a map. Unknown interfaces are down.
#[derive(Default)]
pub struct MemoryGateway {
    states: Mutex<HashMap<String, bool>>,
    fail_set: AtomicBool,
    ignore_up: AtomicBool,
}

impl MemoryGateway {
    /// Sets the state directly, as an outside tool would.
    pub fn force(&self, interface: &str, up: bool) {
        self.states.lock().unwrap().insert(interface.to_string(), up);
    }

    pub fn up(&self, interface: &str) -> bool {
        self.states
            .lock()
            .unwrap()
            .get(interface)
            .copied()
            .unwrap_or(false)
    }

    /// Makes every `set_up` call fail.
    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    /// Accepts `set_up(true)` without actually bringing the interface up.
    pub fn ignore_up(&self, ignore: bool) {
        self.ignore_up.store(ignore, Ordering::SeqCst);
    }
}

#[async_trait]
impl InterfaceStateGateway for MemoryGateway {
    async fn set_up(&self, interface: &str, up: bool) -> io::Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "operation not permitted",
            ));
        }
        if up && self.ignore_up.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.force(interface, up);
        Ok(())
    }

    async fn is_up(&self, interface: &str) -> io::Result<bool> {
        Ok(self.up(interface))
    }
}

/// How launched fake hostapd processes behave.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Runs until killed.
    Healthy,
    /// Exits with the code right away, like hostapd rejecting its config.
    ExitImmediately(i32),
    /// Runs for the given time, then exits with code 1.
    DieAfter(Duration),
}

#[derive(Debug)]
struct FakeHostapd {
    killed: Arc<AtomicBool>,
    launched_at: Instant,
    behavior: Behavior,
}

fn status_of(killed: &AtomicBool, launched_at: Instant, behavior: Behavior) -> ProcessStatus {
    if killed.load(Ordering::SeqCst) {
        return ProcessStatus::Exited(None);
    }
    match behavior {
        Behavior::Healthy => ProcessStatus::Running,
        Behavior::ExitImmediately(code) => ProcessStatus::Exited(Some(code)),
        Behavior::DieAfter(d) if launched_at.elapsed() >= d => ProcessStatus::Exited(Some(1)),
        Behavior::DieAfter(_) => ProcessStatus::Running,
    }
}

impl HostapdProcess for FakeHostapd {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_status(&mut self) -> io::Result<ProcessStatus> {
        Ok(status_of(&self.killed, self.launched_at, self.behavior))
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeHostapd {
    fn drop(&mut self) {
        // Mirrors kill_on_drop
        self.killed.store(true, Ordering::SeqCst);
    }
}

struct Launched {
    killed: Arc<AtomicBool>,
    launched_at: Instant,
    behavior: Behavior,
    args: Vec<OsString>,
}

/// Launcher that hands out [`FakeHostapd`] processes and remembers them.
pub struct FakeLauncher {
    behavior: Mutex<Behavior>,
    launched: Mutex<Vec<Launched>>,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            launched: Mutex::new(Vec::new()),
            launches: AtomicUsize::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Number of launched processes that are still alive.
    pub fn alive(&self) -> usize {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .filter(|l| status_of(&l.killed, l.launched_at, l.behavior) == ProcessStatus::Running)
            .count()
    }

    pub fn last_args(&self) -> Option<Vec<OsString>> {
        self.launched.lock().unwrap().last().map(|l| l.args.clone())
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, _program: &Path, args: &[OsString]) -> io::Result<Box<dyn HostapdProcess>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        let killed = Arc::new(AtomicBool::new(false));
        let launched_at = Instant::now();
        self.launched.lock().unwrap().push(Launched {
            killed: killed.clone(),
            launched_at,
            behavior,
            args: args.to_vec(),
        });
        Ok(Box::new(FakeHostapd {
            killed,
            launched_at,
            behavior,
        }))
    }
}

pub fn fast_timeouts() -> TimeoutConfig {
    TimeoutConfig::new()
        .with_startup_timeout(Duration::from_millis(500))
        .with_settle_delay(Duration::from_millis(30))
        .with_death_timeout(Duration::from_millis(200))
        .with_interface_timeout(Duration::from_millis(200))
        .with_poll_interval(Duration::from_millis(5))
}

/// A manager wired to in-memory backends and a temporary config directory.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub gateway: Arc<MemoryGateway>,
    pub launcher: Arc<FakeLauncher>,
    pub service: ApInterfaceService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeouts(fast_timeouts())
    }

    pub fn with_timeouts(timeouts: TimeoutConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ApConfig::default()
            .with_interface(IFACE)
            .with_config_path(dir.path().join("hostapd.conf"))
            .with_ctrl_interface(dir.path().join("ctrl"))
            .with_timeouts(timeouts);
        let gateway = Arc::new(MemoryGateway::default());
        let launcher = Arc::new(FakeLauncher::new(Behavior::Healthy));
        let manager = ApInterfaceManager::with_backends(config, gateway.clone(), launcher.clone());
        Self {
            dir,
            gateway,
            launcher,
            service: ApInterfaceService::new(manager),
        }
    }

    pub fn manager(&self) -> &ApInterfaceManager {
        self.service.manager()
    }

    pub fn config_path(&self) -> PathBuf {
        self.manager().config().config_path.clone()
    }
}
