//! Server process launcher.
//!
//! Builds the launcher invocation `<launcher> <launch-args…> -jar
//! <exec-path> --nogui`, starts the child in the executable's containing
//! directory with all three stdio streams piped, and extracts the pipe
//! handles. `kill_on_drop(true)` keeps an abandoned child from outliving
//! its supervisor.

use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::config::ServerConfig;
use crate::{AppError, Result};

/// A freshly spawned server process with its pipe handles taken out.
#[derive(Debug)]
pub struct SpawnedServer {
    /// Child process handle — kept alive so `kill_on_drop` works.
    pub child: Child,
    /// The server's stdin for console writes.
    pub stdin: ChildStdin,
    /// Raw stdout stream, to be wrapped by a forwarder.
    pub stdout: ChildStdout,
    /// Raw stderr stream, to be wrapped by a forwarder.
    pub stderr: ChildStderr,
}

/// Build the launch command for the named server without starting it.
#[must_use]
pub fn build_command(config: &ServerConfig) -> Command {
    let mut cmd = Command::new(&config.launcher);
    cmd.args(config.launch_args())
        .current_dir(config.working_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Spawn the server process and capture its stdio pipes.
///
/// # Errors
///
/// Returns `AppError::Launch` when the OS process cannot be started or any
/// of the three pipe handles is missing. Launch failure is fatal for this
/// server and is not retried.
pub fn spawn_server(name: &str, config: &ServerConfig) -> Result<SpawnedServer> {
    let mut child = build_command(config)
        .spawn()
        .map_err(|err| AppError::Launch(format!("server {name}: failed to start: {err}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Launch(format!("server {name}: failed to capture stdin")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Launch(format!("server {name}: failed to capture stdout")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Launch(format!("server {name}: failed to capture stderr")))?;

    info!(
        server = name,
        pid = child.id().unwrap_or(0),
        launcher = %config.launcher,
        "server process spawned"
    );

    Ok(SpawnedServer {
        child,
        stdin,
        stdout,
        stderr,
    })
}
