//! `su`-backed elevated channel
//!
//! One process per command: spawn su, write the command and `exit` to its
//! stdin, drain stdout until EOF, reap the process.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, Command, ExitStatus, Stdio};
use std::thread;
use tracing::{debug, warn};

use super::command::ShellCommand;
use super::{ChannelOutput, ExecError, PrivilegedChannel};
use crate::constants::shell;

#[derive(Debug, Clone)]
pub struct SuChannel {
    binary: PathBuf,
}

impl Default for SuChannel {
    fn default() -> Self {
        Self::new(shell::DEFAULT_SU)
    }
}

impl SuChannel {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl PrivilegedChannel for SuChannel {
    fn execute(&self, command: &ShellCommand) -> Result<ChannelOutput, ExecError> {
        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| classify_spawn_failure(&self.binary, err))?;

        debug!(binary = %self.binary.display(), pid = child.id(), "Opened elevated channel");

        let stderr_handle = spawn_stderr_reader(child.stderr.take());

        // stdin is dropped at the end of the match arm, which closes the pipe
        let write_result = match child.stdin.take() {
            Some(mut stdin) => write_script(&mut stdin, command),
            None => Err(io::Error::other("stdin pipe missing")),
        };

        let mut stdout = String::new();
        let read_result = match child.stdout.take() {
            Some(mut pipe) => read_lossy(&mut pipe, &mut stdout),
            None => Err(io::Error::other("stdout pipe missing")),
        };

        // Always reap, even when I/O failed above
        let status = child.wait()?;
        let stderr = stderr_handle
            .join()
            .map_err(|_| ExecError::execution(None, "stderr reader thread panicked"))?;

        debug!(binary = %self.binary.display(), status = ?status.code(), "Elevated channel closed");

        match write_result {
            // su closed its stdin early (typically a denial); judge by the exit status
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!(error = %err, "Elevated channel closed stdin before the command was sent");
            }
            Err(err) => return Err(err.into()),
            Ok(()) => {}
        }
        read_result?;

        finish(status, stdout, stderr)
    }
}

fn write_script(stdin: &mut impl Write, command: &ShellCommand) -> io::Result<()> {
    stdin.write_all(command.as_str().as_bytes())?;
    stdin.write_all(b"\n")?;
    stdin.write_all(shell::EXIT.as_bytes())?;
    stdin.write_all(b"\n")?;
    stdin.flush()
}

fn read_lossy(reader: &mut impl Read, out: &mut String) -> io::Result<()> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    out.push_str(&String::from_utf8_lossy(&buf));
    Ok(())
}

fn spawn_stderr_reader(pipe: Option<ChildStderr>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut reader) = pipe
            && let Err(err) = read_lossy(&mut reader, &mut out)
        {
            warn!(error = %err, "Failed to read elevated channel stderr");
        }
        out
    })
}

fn classify_spawn_failure(binary: &Path, err: io::Error) -> ExecError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            ExecError::ChannelUnavailable(format!("{} not found", binary.display()))
        }
        io::ErrorKind::PermissionDenied => ExecError::ChannelUnavailable(format!(
            "permission denied executing {}",
            binary.display()
        )),
        _ => ExecError::ChannelUnavailable(format!(
            "failed to spawn {}: {err}",
            binary.display()
        )),
    }
}

fn finish(status: ExitStatus, stdout: String, stderr: String) -> Result<ChannelOutput, ExecError> {
    if status.success() {
        return Ok(ChannelOutput { stdout, stderr });
    }

    let diagnostic = if stderr.trim().is_empty() {
        "no additional output".to_string()
    } else {
        stderr.trim().to_string()
    };

    if stdout.trim().is_empty() && is_denial(&stderr) {
        return Err(ExecError::ChannelUnavailable(format!(
            "su refused elevation: {diagnostic}"
        )));
    }

    match status.code() {
        Some(code) => Err(ExecError::execution(
            Some(code),
            format!("exit code {code}: {diagnostic}"),
        )),
        None => Err(ExecError::execution(
            None,
            format!("terminated by signal: {diagnostic}"),
        )),
    }
}

/// Denials come from su itself, never from the command it ran
///
/// A line counts when su prefixed it (`su: ...`) or when it opens with one of
/// the refusal phrases; messages from inner commands start with their own
/// program name.
fn is_denial(stderr: &str) -> bool {
    stderr.lines().any(|line| {
        let lower = line.trim().to_ascii_lowercase();
        match lower.strip_prefix("su:") {
            Some(rest) => ["denied", "not permitted", "rejected", "not allowed"]
                .iter()
                .any(|word| rest.contains(word)),
            None => shell::DENIAL_MARKERS
                .iter()
                .any(|marker| lower.starts_with(marker)),
        }
    })
}
