//! Process spawn, probe and kill primitives.
//!
//! The supervisor only needs three things from a child process: is it still
//! running, make it stop, and what its pid is for logging. Keeping that behind
//! [`ProcessLauncher`] and [`HostapdProcess`] lets tests script process
//! behaviour without a real hostapd.

use std::ffi::OsString;
use std::fmt::Debug;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Observed status of a launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Still running.
    Running,
    /// Exited with the given code, `None` if killed by a signal.
    Exited(Option<i32>),
}

/// Handle to a launched process.
pub trait HostapdProcess: Send + Debug {
    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;

    /// Non-blocking liveness check. Reaps the process if it has exited.
    fn try_status(&mut self) -> io::Result<ProcessStatus>;

    /// Asks the process to die without waiting for it.
    fn start_kill(&mut self) -> io::Result<()>;
}

/// Starts processes.
pub trait ProcessLauncher: Send + Sync {
    /// Spawns `program` with `args` and returns a handle to it.
    fn launch(&self, program: &Path, args: &[OsString]) -> io::Result<Box<dyn HostapdProcess>>;
}

/// Launcher that runs real executables through `tokio::process`.
///
/// Children are killed when their handle is dropped, so a process the
/// supervisor loses track of cannot outlive it.
#[derive(Debug, Clone, Default)]
pub struct CommandLauncher;

impl CommandLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for CommandLauncher {
    fn launch(&self, program: &Path, args: &[OsString]) -> io::Result<Box<dyn HostapdProcess>> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        Ok(Box::new(ChildProcess { child }))
    }
}

#[derive(Debug)]
struct ChildProcess {
    child: Child,
}

impl HostapdProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_status(&mut self) -> io::Result<ProcessStatus> {
        Ok(match self.child.try_wait()? {
            Some(status) => ProcessStatus::Exited(status.code()),
            None => ProcessStatus::Running,
        })
    }

    fn start_kill(&mut self) -> io::Result<()> {
        match self.child.start_kill() {
            // Already reaped
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            other => other,
        }
    }
}
