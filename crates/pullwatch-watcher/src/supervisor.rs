//! Owns the single supervised child process.
//!
//! At most one child is alive at a time: the previous instance is terminated and
//! reaped before a replacement is spawned.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use pullwatch_core::{ChildCommand, PullwatchError, Result};
use tracing::{debug, error, info, warn};

pub struct ChildSupervisor {
    command: Option<ChildCommand>,
    cwd: PathBuf,
    child: Option<Child>,
}

impl ChildSupervisor {
    /// A relative `cwd` is made absolute here: the child is spawned inside `cwd`,
    /// so a program path resolved against a relative `cwd` would point nowhere.
    pub fn new(command: Option<ChildCommand>, cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let cwd = std::path::absolute(&cwd).unwrap_or(cwd);
        Self {
            command,
            cwd,
            child: None,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn is_configured(&self) -> bool {
        self.command.is_some()
    }

    /// PID of the current child, if one has been started and not reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn is_alive(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "child has exited");
                false
            }
            Err(e) => {
                warn!("Failed to poll child process: {}", e);
                false
            }
        }
    }

    /// Stop the running child (if any) and start a fresh one. Errors are logged.
    pub fn restart(&mut self) {
        if let Err(e) = self.try_restart() {
            error!("Failed to restart program: {}", e);
        }
    }

    fn try_restart(&mut self) -> Result<()> {
        let Some(command) = self.command.clone() else {
            return Ok(());
        };

        if self.is_alive() {
            self.terminate_current()?;
            info!("Stopped previous program");
        }
        self.child = None;

        let program = command.resolve_program(&self.cwd);
        let child = Command::new(&program)
            .args(&command.args)
            .current_dir(&self.cwd)
            .spawn()
            .map_err(|source| PullwatchError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        info!(pid = child.id(), "Restarted program: {}", command.program);
        self.child = Some(child);
        Ok(())
    }

    /// Terminate the child if it is still alive. Used on shutdown.
    pub fn stop(&mut self) {
        if !self.is_alive() {
            return;
        }
        match self.terminate_current() {
            Ok(()) => {
                info!("Stopped program");
                self.child = None;
            }
            Err(e) => error!("Failed to stop program: {}", e),
        }
    }

    fn terminate_current(&mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };
        let pid = child.id();
        debug!(pid, "terminating child");

        send_terminate(child).map_err(|e| PullwatchError::Process(format!("terminate {pid}: {e}")))?;
        let status = child
            .wait()
            .map_err(|e| PullwatchError::Process(format!("wait {pid}: {e}")))?;
        debug!(pid, %status, "child reaped");
        Ok(())
    }
}

impl Drop for ChildSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> io::Result<()> {
    let pid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) has no memory-safety preconditions; the pid belongs to a child
    // we have not reaped yet, so it cannot have been recycled.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> io::Result<()> {
    child.kill()
}
