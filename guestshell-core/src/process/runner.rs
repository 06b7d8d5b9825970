//! External command execution with timeout and captured output

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::Instrument;

use super::CommandResult;
use crate::command::join_command_line;
use crate::error::{ProcessError, ProcessResult};
use crate::tracing::span_names;

/// Default timeout for one-shot commands
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A command to execute: program, arguments, environment and policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    env_removals: Vec<String>,
    timeout: Duration,
    ignore_status: bool,
    shell_line: Option<String>,
}

impl ProcessCommand {
    /// Creates a command running `program` directly
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            env_removals: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ignore_status: true,
            shell_line: None,
        }
    }

    /// Creates a command interpreted by `sh -c`
    #[must_use]
    pub fn shell(line: impl Into<String>) -> Self {
        let line = line.into();
        let mut cmd = Self::new("sh");
        cmd.args = vec!["-c".to_string(), line.clone()];
        cmd.shell_line = Some(line);
        cmd
    }

    /// Appends an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Removes an inherited environment variable from the child
    #[must_use]
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_removals.push(key.into());
        self
    }

    /// Sets the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// When false, a non-zero exit status becomes [`ProcessError::NonZeroExit`]
    #[must_use]
    pub const fn with_ignore_status(mut self, ignore_status: bool) -> Self {
        self.ignore_status = ignore_status;
        self
    }

    /// Program to execute
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Configured timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether non-zero exits are tolerated
    #[must_use]
    pub const fn ignore_status(&self) -> bool {
        self.ignore_status
    }

    /// Human-readable command line; the raw line for shell commands
    #[must_use]
    pub fn display(&self) -> String {
        self.shell_line
            .clone()
            .unwrap_or_else(|| join_command_line(&self.program, &self.args))
    }
}

/// Runs [`ProcessCommand`]s and captures their output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessRunner {
    debug: bool,
}

impl ProcessRunner {
    /// Creates a runner
    #[must_use]
    pub const fn new() -> Self {
        Self { debug: false }
    }

    /// Logs captured output at debug level instead of trace
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Runs a command and waits for it to finish
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The program cannot be spawned
    /// - The timeout elapses (the child is killed)
    /// - The child is terminated by a signal
    /// - The exit status is non-zero and the command does not ignore status
    pub async fn run_async(&self, command: &ProcessCommand) -> ProcessResult<CommandResult> {
        let shown = command.display();
        let span = tracing::info_span!(
            span_names::PROCESS_RUN,
            command = %shown,
            timeout_secs = command.timeout.as_secs()
        );

        self.execute(command, shown).instrument(span).await
    }

    async fn execute(&self, command: &ProcessCommand, display: String) -> ProcessResult<CommandResult> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in &command.env_removals {
            cmd.env_remove(key);
        }
        for (key, value) in &command.envs {
            cmd.env(key, value);
        }

        if self.debug {
            tracing::debug!("Running command in debug mode");
        }

        let started = Instant::now();
        let child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            program: command.program.clone(),
            reason: e.to_string(),
        })?;

        // Dropping the child on timeout kills it (kill_on_drop)
        let output = match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| ProcessError::Io(e.to_string()))?,
            Err(_) => {
                tracing::warn!("Command timed out");
                return Err(ProcessError::Timeout {
                    command: display,
                    timeout: command.timeout,
                });
            }
        };

        let exit_status = exit_code_from_status(output.status)
            .ok_or_else(|| ProcessError::Terminated(display.clone()))?;

        let result = CommandResult::new(
            display,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
            exit_status,
            started.elapsed(),
        );

        if self.debug {
            tracing::debug!(status = result.exit_status, stdout = %result.stdout.trim(), "stdout");
            tracing::debug!(stderr = %result.stderr.trim(), "stderr");
        } else {
            tracing::trace!(status = result.exit_status, "Command finished");
        }

        if result.exit_status != 0 && !command.ignore_status {
            return Err(ProcessError::NonZeroExit {
                result: Box::new(result),
            });
        }

        Ok(result)
    }

    /// Blocking variant of [`Self::run_async`]
    ///
    /// Builds a single-threaded runtime for the duration of the call, so it
    /// must not be called from inside an async context.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run_async`], plus [`ProcessError::Io`] if called from
    /// within a Tokio runtime or if the runtime cannot be built.
    pub fn run(&self, command: &ProcessCommand) -> ProcessResult<CommandResult> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ProcessError::Io(
                "blocking run called from inside an async runtime".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ProcessError::Io(format!("Runtime error: {e}")))?;

        runtime.block_on(self.run_async(command))
    }

    /// Runs a shell line through `sh -c`
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`].
    pub fn run_shell(
        &self,
        line: &str,
        timeout: Duration,
        ignore_status: bool,
    ) -> ProcessResult<CommandResult> {
        let command = ProcessCommand::shell(line)
            .with_timeout(timeout)
            .with_ignore_status(ignore_status);
        self.run(&command)
    }
}

/// Extracts the exit code; `None` when the process was killed by a signal
fn exit_code_from_status(status: ExitStatus) -> Option<i32> {
    status.code()
}
