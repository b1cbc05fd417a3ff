// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bounded execution of external administrative tools.
//!
//! Every tool the suite talks to is invoked through a [`CommandRunner`], which
//! makes the process boundary replaceable in tests.

use std::fmt;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Description of a single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Arguments carry credentials and must not appear in logs or reports.
    pub sensitive: bool,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str], timeout: Duration) -> Self {
        CommandSpec {
            program: program.to_owned(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout,
            sensitive: false,
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// The command line as an operator would type it, used in diagnostics.
    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        if self.sensitive {
            s.push_str(" <arguments redacted>");
            return s;
        }
        for arg in &self.args {
            s.push(' ');
            if arg.contains(' ') {
                s.push('\'');
                s.push_str(arg);
                s.push('\'');
            } else {
                s.push_str(arg);
            }
        }
        s
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Captured result of a finished (or killed) command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    /// Exit code. `None` when the process was killed by a signal, which
    /// includes being terminated after its timeout.
    pub status: Option<i32>,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stdout with trailing newlines removed, the way the tools' single-token
    /// answers are compared.
    pub fn trimmed(&self) -> String {
        self.text().trim_end_matches('\n').to_owned()
    }

    pub fn describe_status(&self) -> String {
        match (self.timed_out, self.status) {
            (true, _) => "timed out".to_owned(),
            (false, Some(code)) => format!("exited with status {}", code),
            (false, None) => "terminated by signal".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o error while reading output of '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[async_trait]
pub trait CommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {}

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner {}
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError> {
        tracing::debug!(command = %command, timeout = ?command.timeout, "spawning");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let mut pipe = child.stdout.take().ok_or_else(|| CommandError::Io {
            program: command.program.clone(),
            source: io::Error::other("stdout was not captured"),
        })?;

        let mut stdout = Vec::new();
        // `read` is cancel safe, so whatever was appended before the deadline
        // survives the timeout dropping this future.
        let completion = async {
            let mut chunk = [0u8; 4096];
            loop {
                let n = pipe.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                stdout.extend_from_slice(&chunk[..n]);
            }
            let status = child.wait().await?;
            Ok::<_, io::Error>(status)
        };

        let outcome = tokio::time::timeout(command.timeout, completion).await;
        match outcome {
            Ok(Ok(status)) => Ok(CommandOutput {
                stdout,
                status: status.code(),
                timed_out: false,
            }),
            Ok(Err(source)) => Err(CommandError::Io {
                program: command.program.clone(),
                source,
            }),
            Err(_) => {
                tracing::warn!(command = %command, "timed out, killing");
                if let Err(e) = child.kill().await {
                    // the child may have exited between the deadline and the kill
                    tracing::warn!(command = %command, error = %e, "kill failed");
                }
                Ok(CommandOutput {
                    stdout,
                    status: None,
                    timed_out: true,
                })
            }
        }
    }
}
