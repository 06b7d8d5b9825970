//! Persistent guestfish session manager
//!
//! The `SessionManager` owns at most one guestfish session at a time and
//! funnels every inner operation through [`SessionManager::inner_cmd`]. It
//! handles the lifecycle:
//! - Creating a session on construction (or attaching to a remote one)
//! - Replacing the session on [`SessionManager::new_session`]
//! - Detecting a dead session and refusing to use it
//! - Closing gracefully with escalation, and best-effort on drop

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::classifier::OutputClassifier;
use super::counter::SessionCounter;
use super::interactive::InteractiveSession;
use super::remote::RemoteSession;
use super::shell::{CloseOutcome, GuestfishShell, SessionId};
use crate::command::RunMode;
use crate::config::GuestfishConfig;
use crate::error::{SessionError, SessionResult};
use crate::process::CommandResult;
use crate::tracing::span_names;

/// Command used to check that a fresh local session answers
pub const PROBE_COMMAND: &str = "is-config";

/// Lifecycle state of a manager's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session has been opened yet
    Uninitialized,
    /// A session is open
    Open,
    /// The last session was closed
    Closed,
}

/// Snapshot of the current session for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    /// Session identity
    pub id: SessionId,
    /// Transport
    pub mode: RunMode,
    /// guestfish process id, for interactive sessions
    pub pid: Option<u32>,
    /// When the session was opened
    pub opened_at: DateTime<Utc>,
    /// Inner commands dispatched so far
    pub commands_sent: u64,
    /// Open sessions in this process
    pub open_sessions: usize,
}

/// Owns one guestfish session and dispatches inner commands to it
pub struct SessionManager {
    config: GuestfishConfig,
    classifier: Arc<dyn OutputClassifier>,
    counter: SessionCounter,
    shell: Option<Box<dyn GuestfishShell>>,
    state: SessionState,
    /// Set once a dispatch observed the process gone
    dead: bool,
    opened_at: Option<DateTime<Utc>>,
    commands_sent: u64,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_id", &self.session_id())
            .field("state", &self.state)
            .field("mode", &self.config.mode)
            .field("dead", &self.dead)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Opens a session using the process-wide counter
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the session cannot
    /// be started, or the liveness probe fails.
    pub fn new(config: GuestfishConfig) -> SessionResult<Self> {
        Self::with_counter(config, SessionCounter::global())
    }

    /// Opens a session that reports to `counter`
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_counter(config: GuestfishConfig, counter: SessionCounter) -> SessionResult<Self> {
        config.validate()?;
        let classifier = Arc::new(config.classifier()?);
        Self::with_classifier(config, classifier, counter)
    }

    /// Opens a session with a custom output classifier
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_classifier(
        config: GuestfishConfig,
        classifier: Arc<dyn OutputClassifier>,
        counter: SessionCounter,
    ) -> SessionResult<Self> {
        config.validate()?;

        let mut manager = Self {
            config,
            classifier,
            counter,
            shell: None,
            state: SessionState::Uninitialized,
            dead: false,
            opened_at: None,
            commands_sent: 0,
        };

        if let Some(id) = manager.config.remote_id {
            manager.attach(id);
        } else {
            manager.new_session()?;
        }

        if manager.config.mode == RunMode::Interactive {
            if let Err(e) = manager.probe() {
                manager.close_session();
                return Err(e);
            }
        }

        Ok(manager)
    }

    fn attach(&mut self, id: u32) {
        let shell = RemoteSession::attach(id, &self.config, Arc::clone(&self.classifier));
        tracing::info!(remote_id = id, "Attached to existing guestfish session");
        self.install(Box::new(shell));
    }

    fn install(&mut self, shell: Box<dyn GuestfishShell>) {
        let id = shell.id();
        let pid = shell.pid();
        self.shell = Some(shell);
        self.state = SessionState::Open;
        self.dead = false;
        self.opened_at = Some(Utc::now());
        self.commands_sent = 0;
        let open_sessions = self.counter.increment();
        tracing::info!(session_id = %id, ?pid, open_sessions, "guestfish session opened");
    }

    /// Sends the liveness probe regardless of `ignore_status`
    fn probe(&mut self) -> SessionResult<()> {
        let result = self.dispatch(PROBE_COMMAND, self.config.probe_timeout)?;
        if result.exit_status != 0 {
            tracing::error!(output = %result.stdout.trim(), "guestfish probe failed");
            return Err(SessionError::ProbeFailed {
                command: PROBE_COMMAND.to_string(),
                status: result.exit_status,
            });
        }
        Ok(())
    }

    /// Replaces the current session with a fresh one
    ///
    /// Any open session is closed first; failures while closing it are
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the new session cannot be started. The manager is
    /// left without a session in that case.
    pub fn new_session(&mut self) -> SessionResult<SessionId> {
        let span = crate::trace_operation!(span_names::SESSION_OPEN, mode = %self.config.mode);
        let _guard = span.enter();

        self.close_session();

        let shell: Box<dyn GuestfishShell> = match self.config.mode {
            RunMode::Interactive => Box::new(InteractiveSession::spawn(
                &self.config,
                Arc::clone(&self.classifier),
            )?),
            RunMode::Remote => Box::new(RemoteSession::start(
                &self.config,
                Arc::clone(&self.classifier),
            )?),
        };

        let id = shell.id();
        self.install(shell);
        Ok(id)
    }

    /// Resolves the current session
    ///
    /// A session observed dead by an earlier command is cleared here and the
    /// counter decremented.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` if there is no usable session;
    /// call [`Self::new_session`] to get one.
    pub fn open_session(&mut self) -> SessionResult<SessionId> {
        let Some(shell) = self.shell.as_ref() else {
            return Err(SessionError::NoActiveSession);
        };
        let id = shell.id();

        if self.dead {
            self.shell = None;
            self.dead = false;
            self.state = SessionState::Closed;
            let open_sessions = self.counter.decrement();
            tracing::warn!(session_id = %id, open_sessions, "guestfish session is gone, cleared");
            return Err(SessionError::NoActiveSession);
        }

        Ok(id)
    }

    /// Runs one inner command through the current session
    ///
    /// `command` is sent verbatim and becomes the result's `command`.
    /// `stderr` is always empty for the interactive transport. With
    /// `ignore_status` off, a non-zero status becomes an error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `command` contains a line break
    /// - There is no usable session
    /// - The prompt does not return in time
    /// - guestfish exited (later calls then fail with `NoActiveSession`)
    /// - The output carries an error marker and `ignore_status` is off
    pub fn inner_cmd(&mut self, command: &str) -> SessionResult<CommandResult> {
        let result = self.dispatch(command, self.config.timeout)?;

        if result.exit_status != 0 && !self.config.ignore_status {
            return Err(SessionError::CommandFailed {
                result: Box::new(result),
            });
        }
        Ok(result)
    }

    fn dispatch(&mut self, command: &str, timeout: Duration) -> SessionResult<CommandResult> {
        if command.contains(['\n', '\r']) {
            return Err(SessionError::InvalidCommand(format!(
                "line breaks are not allowed: {command:?}"
            )));
        }

        let id = self.open_session()?;
        let shell = self.shell.as_mut().ok_or(SessionError::NoActiveSession)?;

        let span = crate::trace_operation!(span_names::SESSION_COMMAND, session_id = %id, command = %command);
        let _guard = span.enter();

        let started = Instant::now();
        let reply = match shell.send(command, timeout) {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_process_terminated() {
                    self.dead = true;
                    tracing::warn!(%e, "guestfish process terminated");
                } else if e.is_timeout() {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "guestfish command timed out");
                }
                return Err(e);
            }
        };
        self.commands_sent += 1;

        let result = CommandResult::new(command, reply.output, "", reply.status, started.elapsed());
        if self.config.debug {
            tracing::debug!(status = result.exit_status, stdout = %result.stdout.trim(), "Command finished");
        } else {
            tracing::trace!(status = result.exit_status, "Command finished");
        }
        Ok(result)
    }

    /// Closes the current session
    ///
    /// Sends `quit` and escalates to signals if needed. Errors from the
    /// transport are treated as an already closed session. Returns `None`
    /// when there was nothing to close.
    pub fn close_session(&mut self) -> Option<CloseOutcome> {
        let mut shell = self.shell.take()?;
        let id = shell.id();

        let span = crate::trace_operation!(span_names::SESSION_CLOSE, session_id = %id);
        let _guard = span.enter();

        let outcome = match shell.close() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(%e, "Error while closing guestfish session, treating as closed");
                CloseOutcome::AlreadyClosed
            }
        };

        self.state = SessionState::Closed;
        self.dead = false;
        let open_sessions = self.counter.decrement();
        tracing::info!(%outcome, open_sessions, "guestfish session closed");
        Some(outcome)
    }

    /// Current session id, if any
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.shell.as_ref().map(|s| s.id())
    }

    /// Lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true if a session is held and its process is running
    pub fn is_session_alive(&mut self) -> bool {
        !self.dead && self.shell.as_mut().is_some_and(|s| s.is_alive())
    }

    /// Session configuration
    #[must_use]
    pub const fn config(&self) -> &GuestfishConfig {
        &self.config
    }

    /// Counter this manager reports to
    #[must_use]
    pub const fn counter(&self) -> &SessionCounter {
        &self.counter
    }

    /// Diagnostics snapshot of the current session
    #[must_use]
    pub fn session_info(&self) -> Option<SessionInfo> {
        let shell = self.shell.as_ref()?;
        Some(SessionInfo {
            id: shell.id(),
            mode: self.config.mode,
            pid: shell.pid(),
            opened_at: self.opened_at.unwrap_or_else(Utc::now),
            commands_sent: self.commands_sent,
            open_sessions: self.counter.get(),
        })
    }

    /// Sets whether non-zero statuses are tolerated
    pub fn set_ignore_status(&mut self, ignore_status: bool) {
        self.config.ignore_status = ignore_status;
    }

    /// Enables or disables debug logging of command output
    pub fn set_debug(&mut self, debug: bool) {
        if self.config.debug == debug {
            return;
        }
        self.config.debug = debug;
        if debug {
            tracing::debug!("Libguestfs debugging enabled");
        } else {
            tracing::debug!("Libguestfs debugging disabled");
        }
    }

    /// Sets the timeout for subsequent inner commands
    pub fn set_timeout(&mut self, timeout: Duration) {
        if timeout.is_zero() {
            tracing::debug!("Ignoring zero timeout");
            return;
        }
        self.config.timeout = timeout;
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close_session();
    }
}
