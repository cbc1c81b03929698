//! PersistentShell - one long-lived shell process per run
//!
//! Commands are written to the shell's stdin wrapped as
//!
//! ```text
//! command eval '<command>' 2>&1 </dev/null
//! printf '%s %d\n' '<marker>' "$?"
//! ```
//!
//! and stdout is read until the marker line, which also carries the exit
//! status. The command travels as a single-quoted word, so an unterminated
//! quote or a trailing backslash is a syntax error inside `eval` (status 2)
//! rather than a shell waiting for more input. `command` keeps a POSIX shell
//! from exiting on that error. The marker is unique per command so output can never fake it by
//! accident. Shell state (cwd, exported variables) persists between calls.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{ShellLauncher, ShellSession};
use crate::error::{FlowError, Result};

struct ShellProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ShellProcess {
    fn spawn(program: &str, cwd: Option<&PathBuf>) -> Result<Self> {
        let mut cmd = Command::new(program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| FlowError::Shell(format!("failed to start '{program}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FlowError::Shell("shell stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FlowError::Shell("shell stdout not captured".into()))?;

        debug!(program, pid = child.id(), "shell started");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Write the wrapped command and read up to the marker
    async fn run(&mut self, script: &str, marker: &str) -> std::io::Result<(String, i32)> {
        self.stdin.write_all(script.as_bytes()).await?;
        self.stdin.flush().await?;

        let mut output = String::new();
        let mut buf = Vec::with_capacity(256);
        loop {
            buf.clear();
            let n = self.stdout.read_until(b'\n', &mut buf).await?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "shell exited before the command finished",
                ));
            }

            let line = String::from_utf8_lossy(&buf);
            if let Some(pos) = line.find(marker) {
                // output without a trailing newline shares the marker line
                output.push_str(&line[..pos]);
                let code = line[pos + marker.len()..].trim().parse().unwrap_or(-1);
                return Ok((output, code));
            }
            output.push_str(&line);
        }
    }

    async fn kill(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill shell");
        }
    }
}

enum Outcome {
    Finished(std::io::Result<(String, i32)>),
    Cancelled,
}

pub struct PersistentShell {
    program: String,
    cwd: Option<PathBuf>,
    process: Mutex<Option<ShellProcess>>,
    next_marker: AtomicU64,
}

impl PersistentShell {
    /// Start `program` (e.g. `bash`) with piped stdio
    pub fn spawn(program: impl Into<String>, cwd: Option<PathBuf>) -> Result<Self> {
        let program = program.into();
        let process = ShellProcess::spawn(&program, cwd.as_ref())?;
        Ok(Self {
            program,
            cwd,
            process: Mutex::new(Some(process)),
            next_marker: AtomicU64::new(0),
        })
    }

    fn marker(&self) -> String {
        format!(
            "__nodeflow_done_{}_{}__",
            std::process::id(),
            self.next_marker.fetch_add(1, Ordering::Relaxed)
        )
    }

    fn wrap(command: &str, marker: &str) -> String {
        let quoted = command.replace('\'', r"'\''");
        format!("command eval '{quoted}' 2>&1 </dev/null\nprintf '%s %d\\n' '{marker}' \"$?\"\n")
    }
}

#[async_trait]
impl ShellSession for PersistentShell {
    async fn execute(&self, command: &str, cancel: &CancellationToken) -> Result<String> {
        let mut guard = self.process.lock().await;
        if guard.is_none() {
            // previous command killed or lost the shell
            *guard = Some(ShellProcess::spawn(&self.program, self.cwd.as_ref())?);
        }
        let Some(process) = guard.as_mut() else {
            return Err(FlowError::Shell("shell is not running".into()));
        };

        let marker = self.marker();
        let script = Self::wrap(command, &marker);
        debug!(command, "shell execute");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Outcome::Cancelled,
            res = process.run(&script, &marker) => Outcome::Finished(res),
        };

        match outcome {
            Outcome::Finished(Ok((output, 0))) => Ok(output.trim_end_matches('\n').to_string()),
            Outcome::Finished(Ok((output, code))) => Err(FlowError::Shell(format!(
                "command exited with status {code}: {}",
                output.trim_end()
            ))),
            Outcome::Finished(Err(e)) => {
                if let Some(process) = guard.take() {
                    process.kill().await;
                }
                Err(FlowError::Shell(e.to_string()))
            }
            Outcome::Cancelled => {
                if let Some(process) = guard.take() {
                    process.kill().await;
                }
                Err(FlowError::Shell("command cancelled".into()))
            }
        }
    }

    async fn dispose(&self) {
        if let Some(process) = self.process.lock().await.take() {
            debug!("shell disposed");
            process.kill().await;
        }
    }
}

/// Launches a [`PersistentShell`] per run
#[derive(Debug, Clone)]
pub struct PersistentShellLauncher {
    program: String,
    cwd: Option<PathBuf>,
}

impl PersistentShellLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

#[async_trait]
impl ShellLauncher for PersistentShellLauncher {
    async fn launch(&self) -> Result<Box<dyn ShellSession>> {
        Ok(Box::new(PersistentShell::spawn(
            self.program.clone(),
            self.cwd.clone(),
        )?))
    }
}
