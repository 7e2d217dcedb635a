//! Subprocess invocation of the `studio` CLI.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

use crate::config::CommandSpec;

/// Captured result of one `studio` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    /// `0` when the OS reported no code (e.g. the child died from a signal).
    pub exit_code: i32,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' did not finish within {}s", after.as_secs())]
    TimedOut { program: String, after: Duration },
}

/// Runs the `studio` binary with the given arguments.
///
/// The server only ever talks to this trait; tests swap in a scripted fake.
#[async_trait]
pub trait StudioRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<CliOutput, RunError>;
}

/// Spawns a real child process per call.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: CommandSpec,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(command: CommandSpec, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }

    fn build(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out future drops the child; make sure it goes with it.
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl StudioRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> Result<CliOutput, RunError> {
        let program = self.command.program.clone();
        tracing::debug!(program = %self.command, ?args, "spawning studio");

        let started = Instant::now();
        let child = self
            .build(args)
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.clone(),
                source,
            })?;

        let waited = match self.timeout {
            Some(after) => tokio::time::timeout(after, child.wait_with_output())
                .await
                .map_err(|_| RunError::TimedOut {
                    program: program.clone(),
                    after,
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|source| RunError::Spawn { program, source })?;

        let result = CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(0),
        };
        tracing::debug!(
            exit_code = result.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "studio finished"
        );
        Ok(result)
    }
}
