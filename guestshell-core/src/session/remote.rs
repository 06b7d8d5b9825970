//! Remote guestfish sessions
//!
//! `guestfish --listen` forks a server and prints its id as
//! `GUESTFISH_PID=<n>; export GUESTFISH_PID`. Every command is then a
//! separate `guestfish --remote=<n> <command>` invocation, so no handle is
//! held between calls.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

use super::classifier::OutputClassifier;
use super::shell::{CloseOutcome, GuestfishShell, SessionId, ShellOutput};
use crate::command::{GuestfishLaunch, RunMode, shell_quote};
use crate::config::GuestfishConfig;
use crate::error::{ProcessError, SessionError, SessionResult};
use crate::process::{ProcessCommand, ProcessRunner};

static REMOTE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("REMOTE_ID is a valid regex pattern"));

/// Extracts the session id from `guestfish --listen` output
///
/// # Errors
///
/// Returns `SessionError::MissingRemoteId` if the output contains no number.
pub fn parse_remote_id(output: &str) -> SessionResult<u32> {
    REMOTE_ID
        .find(output)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| SessionError::MissingRemoteId(output.trim().to_string()))
}

/// Handle to a `guestfish --listen` server
#[derive(Debug)]
pub struct RemoteSession {
    id: u32,
    program: String,
    runner: ProcessRunner,
    classifier: Arc<dyn OutputClassifier>,
    env: Vec<(String, String)>,
    alive: bool,
}

impl RemoteSession {
    /// Starts a listener and binds to the id it reports
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be run, fails, or prints no id.
    pub fn start(
        config: &GuestfishConfig,
        classifier: Arc<dyn OutputClassifier>,
    ) -> SessionResult<Self> {
        let launch = GuestfishLaunch {
            mode: RunMode::Remote,
            ..config.launch()
        };
        let runner = ProcessRunner::new().with_debug(config.debug);

        let mut command = ProcessCommand::new(launch.program())
            .args(launch.build_args())
            .with_timeout(config.startup_timeout)
            .with_ignore_status(false);
        for (key, value) in &config.env {
            command = command.env(key.clone(), value.clone());
        }

        let result = runner.run(&command).map_err(|e| match e {
            ProcessError::NonZeroExit { result } => SessionError::StartFailed(format!(
                "guestfish --listen exited with {}: {}",
                result.exit_status,
                result.stderr.trim()
            )),
            ProcessError::SpawnFailed { program, reason } => {
                SessionError::StartFailed(format!("Failed to spawn '{program}': {reason}"))
            }
            other => SessionError::Process(other),
        })?;

        let id = parse_remote_id(&result.stdout)?;
        tracing::debug!(remote_id = id, "guestfish listener started");

        Ok(Self::attach(id, config, classifier))
    }

    /// Binds to an already running listener without spawning anything
    #[must_use]
    pub fn attach(id: u32, config: &GuestfishConfig, classifier: Arc<dyn OutputClassifier>) -> Self {
        Self {
            id,
            program: config.guestfish_path.to_string_lossy().into_owned(),
            runner: ProcessRunner::new().with_debug(config.debug),
            classifier,
            env: config.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            alive: true,
        }
    }

    /// Numeric session id
    #[must_use]
    pub const fn remote_id(&self) -> u32 {
        self.id
    }

    /// Shell line dispatching `command`; the command keeps guestfish quoting
    #[must_use]
    pub fn command_line(&self, command: &str) -> String {
        format!("{} --remote={} {command}", shell_quote(&self.program), self.id)
    }

    fn dispatch(&self, command: &str, timeout: Duration) -> SessionResult<(i32, String)> {
        let mut process = ProcessCommand::shell(self.command_line(command))
            .with_timeout(timeout)
            .with_ignore_status(true);
        for (key, value) in &self.env {
            process = process.env(key.clone(), value.clone());
        }

        let result = self.runner.run(&process).map_err(|e| match e {
            ProcessError::Timeout { timeout, .. } => SessionError::Timeout {
                command: command.to_string(),
                timeout,
                partial_output: String::new(),
            },
            ProcessError::Terminated(_) => SessionError::ProcessTerminated {
                command: command.to_string(),
                partial_output: String::new(),
            },
            other => SessionError::Process(other),
        })?;

        let mut output = result.stdout;
        output.push_str(&result.stderr);
        Ok((result.exit_status, output))
    }
}

impl GuestfishShell for RemoteSession {
    fn id(&self) -> SessionId {
        SessionId::Remote(self.id)
    }

    fn send(&mut self, command: &str, timeout: Duration) -> SessionResult<ShellOutput> {
        let (exit_status, output) = self.dispatch(command, timeout)?;

        let mut status = self.classifier.classify(&output);
        if exit_status != 0 {
            status = 1;
        }
        Ok(ShellOutput { status, output })
    }

    fn close(&mut self) -> SessionResult<CloseOutcome> {
        if !self.alive {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        self.alive = false;

        let (exit_status, output) = self.dispatch("quit", Duration::from_secs(10))?;
        if exit_status == 0 {
            Ok(CloseOutcome::Graceful)
        } else {
            tracing::debug!(remote_id = self.id, output = %output.trim(), "Remote quit failed");
            Ok(CloseOutcome::AlreadyClosed)
        }
    }

    fn is_alive(&mut self) -> bool {
        self.alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ErrorMarkerClassifier;

    #[test]
    fn test_parse_remote_id() {
        assert_eq!(
            parse_remote_id("GUESTFISH_PID=4242; export GUESTFISH_PID\n").unwrap(),
            4242
        );
        assert_eq!(parse_remote_id("  17").unwrap(), 17);
    }

    #[test]
    fn test_parse_remote_id_missing() {
        let err = parse_remote_id("no id here").unwrap_err();
        assert!(matches!(err, SessionError::MissingRemoteId(_)));
    }

    #[test]
    fn test_command_line() {
        let config = GuestfishConfig::new().with_guestfish_path("/opt/guest fish");
        let session = RemoteSession::attach(7, &config, Arc::new(ErrorMarkerClassifier::default()));
        assert_eq!(
            session.command_line("write /etc/motd \"hi there\""),
            "'/opt/guest fish' --remote=7 write /etc/motd \"hi there\""
        );
        assert_eq!(session.id(), SessionId::Remote(7));
    }
}
