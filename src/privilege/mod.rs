//! Elevated command execution
//!
//! `PrivilegedChannel` is the capability the bridge depends on; `SuChannel`
//! is the shell-backed implementation. Commands are always `ShellCommand`s,
//! so untrusted text is quoted where it enters the command and nowhere else.

mod command;
mod error;
mod su;

use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

pub use command::{ShellCommand, shell_quote};
pub use error::ExecError;
pub use su::SuChannel;

use crate::constants::paths;

/// Everything a channel captured for one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs one command with elevated privileges
///
/// Implementations open a fresh channel per call and must not leave a
/// process running after returning.
pub trait PrivilegedChannel: Send + Sync {
    fn execute(&self, command: &ShellCommand) -> Result<ChannelOutput, ExecError>;
}

impl<T: PrivilegedChannel + ?Sized> PrivilegedChannel for std::sync::Arc<T> {
    fn execute(&self, command: &ShellCommand) -> Result<ChannelOutput, ExecError> {
        (**self).execute(command)
    }
}

/// Executes commands over a channel and hands back trimmed stdout
#[derive(Debug, Clone)]
pub struct PrivilegedExecutor<C> {
    channel: C,
}

impl<C: PrivilegedChannel> PrivilegedExecutor<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn execute(&self, command: &ShellCommand) -> Result<String, ExecError> {
        debug!(program = command.program_name(), "Executing elevated command");
        trace!(command = %command, "Elevated command script");
        match self.channel.execute(command) {
            Ok(output) => {
                if !output.stderr.trim().is_empty() {
                    debug!(stderr = %output.stderr.trim(), "Elevated command wrote to stderr");
                }
                Ok(output.stdout.trim().to_string())
            }
            Err(err) => {
                warn!(error = %err, "Elevated command failed");
                Err(err)
            }
        }
    }
}

/// What the host offers for elevation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeStatus {
    /// Effective uid is already 0
    pub running_as_root: bool,
    /// First su binary found at a well-known location
    pub su_binary: Option<PathBuf>,
}

pub fn privilege_status() -> PrivilegeStatus {
    PrivilegeStatus {
        running_as_root: running_as_root(),
        su_binary: locate_su(),
    }
}

/// Probe the well-known su locations
pub fn locate_su() -> Option<PathBuf> {
    locate_in(paths::KNOWN_SU_PATHS)
}

fn locate_in(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}
