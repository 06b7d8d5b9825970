//! Interactive guestfish over a pseudo-terminal
//!
//! guestfish prints its prompt only when stdin is a terminal, so the shell
//! runs on a PTY. A reader thread forwards raw output chunks over a channel;
//! [`InteractiveSession::send`] writes one line and collects chunks until the
//! prompt reappears.

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use regex::Regex;

use super::classifier::OutputClassifier;
use super::shell::{CloseOutcome, GuestfishShell, SessionId, ShellOutput};
use crate::command::GUESTFISH_COLOR_ENVS;
use crate::config::GuestfishConfig;
use crate::error::{SessionError, SessionResult};

/// Terminal width; wide enough that guestfish never wraps a command line
const PTY_COLS: u16 = 512;
const PTY_ROWS: u16 = 24;
const PTY_READ_BUFFER: usize = 8192;

/// How often a blocked read re-checks whether the child is still running
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timeout for the reply to `quit` during close
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[a-zA-Z]|\x1b\][^\x07]*\x07|\x1b[()][A-Z0-9]|\x1b[=>]")
        .expect("ANSI_ESCAPE is a valid regex pattern")
});

/// Removes carriage returns and terminal escape sequences
#[must_use]
pub fn normalize_output(raw: &str) -> String {
    ANSI_ESCAPE.replace_all(raw, "").replace('\r', "")
}

/// Returns true if the last line of `text` is a complete prompt
fn ends_with_prompt(prompt: &Regex, text: &str) -> bool {
    let last = text.rsplit('\n').next().unwrap_or(text);
    prompt.find_iter(last).any(|m| m.end() == last.len())
}

/// Strips the echoed command line and the trailing prompt from a reply
#[must_use]
pub fn clean_reply(prompt: &Regex, command: &str, normalized: &str) -> String {
    let mut lines: Vec<&str> = normalized.split('\n').collect();

    if lines
        .last()
        .is_some_and(|last| prompt.find_iter(last).any(|m| m.end() == last.len()))
    {
        lines.pop();
    }

    if lines
        .first()
        .is_some_and(|first| first.trim_end().ends_with(command.trim()))
    {
        lines.remove(0);
    }

    if lines.is_empty() {
        return String::new();
    }
    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// One guestfish process running on a pseudo-terminal
pub struct InteractiveSession {
    id: SessionId,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    // Dropping the master closes the terminal; kept for the session lifetime
    _master: Box<dyn MasterPty + Send>,
    output_rx: Receiver<Vec<u8>>,
    prompt: Regex,
    classifier: Arc<dyn OutputClassifier>,
    close_grace: Duration,
    alive: bool,
    // Command whose reply had not arrived when it timed out
    outstanding: Option<String>,
}

impl std::fmt::Debug for InteractiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveSession")
            .field("id", &self.id)
            .field("pid", &self.child.process_id())
            .field("prompt", &self.prompt.as_str())
            .field("alive", &self.alive)
            .finish_non_exhaustive()
    }
}

impl InteractiveSession {
    /// Spawns guestfish and waits for its first prompt
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StartFailed` if the terminal cannot be opened,
    /// guestfish cannot be spawned, or no prompt appears within the startup
    /// timeout. Returns `SessionError::Config` for invalid patterns.
    pub fn spawn(
        config: &GuestfishConfig,
        classifier: Arc<dyn OutputClassifier>,
    ) -> SessionResult<Self> {
        let prompt = config.prompt_regex()?;
        let launch = config.launch();

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: PTY_ROWS,
                cols: PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| SessionError::StartFailed(format!("Failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(launch.program());
        cmd.args(launch.build_args());
        for var in GUESTFISH_COLOR_ENVS {
            cmd.env_remove(var);
        }
        cmd.env("TERM", "dumb");
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        tracing::debug!(command = %launch.command_line(), "Spawning guestfish");
        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            SessionError::StartFailed(format!("Failed to spawn '{}': {e}", launch.program()))
        })?;
        // EOF on the master requires every slave handle to be closed
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SessionError::StartFailed(format!("Failed to clone PTY reader: {e}")))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SessionError::StartFailed(format!("Failed to take PTY writer: {e}")))?;

        let (output_tx, output_rx) = mpsc::channel();
        thread::Builder::new()
            .name("guestfish-pty-reader".to_string())
            .spawn(move || {
                let mut reader = reader;
                let mut buf = [0u8; PTY_READ_BUFFER];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if output_tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                        // EIO once the child has exited
                        Err(_) => break,
                    }
                }
            })
            .map_err(|e| SessionError::StartFailed(format!("Failed to start reader thread: {e}")))?;

        let mut session = Self {
            id: SessionId::new_local(),
            child,
            writer,
            _master: pair.master,
            output_rx,
            prompt,
            classifier,
            close_grace: config.close_grace,
            alive: true,
            outstanding: None,
        };

        match session.read_until_prompt("<startup>", config.startup_timeout) {
            Ok(banner) => {
                tracing::debug!(
                    session_id = %session.id,
                    pid = ?session.child.process_id(),
                    banner = %banner.trim(),
                    "guestfish prompt received"
                );
                Ok(session)
            }
            Err(e) => {
                let detail = match e {
                    SessionError::Timeout { timeout, partial_output, .. } => format!(
                        "no prompt within {}s, output: {}",
                        timeout.as_secs(),
                        partial_output.trim()
                    ),
                    SessionError::ProcessTerminated { partial_output, .. } => {
                        format!("guestfish exited during startup: {}", partial_output.trim())
                    }
                    other => other.to_string(),
                };
                session.kill_quietly();
                Err(SessionError::StartFailed(detail))
            }
        }
    }

    /// Returns true if the child has exited, updating the alive flag
    fn has_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(session_id = %self.id, ?status, "guestfish exited");
                self.alive = false;
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(session_id = %self.id, %e, "Failed to query guestfish status");
                false
            }
        }
    }

    /// Waits for the prompt that ends a timed-out command's reply
    ///
    /// The late reply is dropped. If it still has not arrived, the new
    /// command is not written and times out as well.
    fn settle_outstanding(&mut self, command: &str, timeout: Duration) -> SessionResult<()> {
        let Some(previous) = self.outstanding.clone() else {
            return Ok(());
        };

        match self.read_until_prompt(&previous, timeout) {
            Ok(late) => {
                tracing::debug!(
                    session_id = %self.id,
                    command = %previous,
                    bytes = late.len(),
                    "Dropping late reply of timed-out command"
                );
                self.outstanding = None;
                Ok(())
            }
            Err(SessionError::Timeout { partial_output, .. }) => Err(SessionError::Timeout {
                command: command.to_string(),
                timeout,
                partial_output: format!(
                    "'{previous}' is still running, command not sent\n{partial_output}"
                ),
            }),
            Err(e) => Err(e),
        }
    }

    /// Drops output left over from an earlier timed-out command
    fn discard_stale_output(&mut self) {
        let mut stale = Vec::new();
        while let Ok(chunk) = self.output_rx.try_recv() {
            stale.extend_from_slice(&chunk);
        }
        if !stale.is_empty() {
            tracing::debug!(
                session_id = %self.id,
                bytes = stale.len(),
                "Discarding stale guestfish output"
            );
        }
    }

    fn read_until_prompt(&mut self, command: &str, timeout: Duration) -> SessionResult<String> {
        let deadline = Instant::now() + timeout;
        let mut raw = Vec::new();

        loop {
            let text = normalize_output(&String::from_utf8_lossy(&raw));
            if ends_with_prompt(&self.prompt, &text) {
                return Ok(text);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::Timeout {
                    command: command.to_string(),
                    timeout,
                    partial_output: text,
                });
            }

            match self.output_rx.recv_timeout((deadline - now).min(POLL_INTERVAL)) {
                Ok(chunk) => raw.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    if self.has_exited() {
                        while let Ok(chunk) = self.output_rx.try_recv() {
                            raw.extend_from_slice(&chunk);
                        }
                        return Err(SessionError::ProcessTerminated {
                            command: command.to_string(),
                            partial_output: normalize_output(&String::from_utf8_lossy(&raw)),
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // EOF on the terminal; reap the child so it is not left a zombie
                    let _ = self.wait_for_exit(self.close_grace);
                    self.alive = false;
                    return Err(SessionError::ProcessTerminated {
                        command: command.to_string(),
                        partial_output: text,
                    });
                }
            }
        }
    }

    fn write_line(&mut self, command: &str) -> SessionResult<()> {
        let result = self
            .writer
            .write_all(format!("{command}\n").as_bytes())
            .and_then(|()| self.writer.flush());

        result.map_err(|e| {
            if self.has_exited() {
                SessionError::ProcessTerminated {
                    command: command.to_string(),
                    partial_output: String::new(),
                }
            } else {
                SessionError::Io(format!("Failed to write to guestfish: {e}"))
            }
        })
    }

    /// Waits up to the grace period for the child to exit
    fn wait_for_exit(&mut self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            if self.has_exited() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(50));
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Some(pid) = self.child.process_id() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                tracing::debug!(session_id = %self.id, %e, "SIGTERM failed");
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {}

    fn kill_quietly(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::debug!(session_id = %self.id, %e, "Kill failed");
        }
        let _ = self.wait_for_exit(self.close_grace);
        self.alive = false;
    }
}

impl GuestfishShell for InteractiveSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn send(&mut self, command: &str, timeout: Duration) -> SessionResult<ShellOutput> {
        if !self.alive || self.has_exited() {
            return Err(SessionError::ProcessTerminated {
                command: command.to_string(),
                partial_output: String::new(),
            });
        }

        self.settle_outstanding(command, timeout)?;
        self.discard_stale_output();
        self.write_line(command)?;
        let text = match self.read_until_prompt(command, timeout) {
            Ok(text) => text,
            Err(e) => {
                if matches!(e, SessionError::Timeout { .. }) {
                    self.outstanding = Some(command.to_string());
                }
                return Err(e);
            }
        };

        let output = clean_reply(&self.prompt, command, &text);
        let status = self.classifier.classify(&output);
        Ok(ShellOutput { status, output })
    }

    fn close(&mut self) -> SessionResult<CloseOutcome> {
        if !self.alive || self.has_exited() {
            return Ok(CloseOutcome::AlreadyClosed);
        }

        // The process exiting is the expected reply to quit
        if let Err(SessionError::ProcessTerminated { .. }) = self.send("quit", QUIT_TIMEOUT)
            && self.wait_for_exit(self.close_grace)
        {
            return Ok(CloseOutcome::Graceful);
        }
        if self.wait_for_exit(self.close_grace) {
            return Ok(CloseOutcome::Graceful);
        }

        tracing::debug!(session_id = %self.id, "guestfish ignored quit, sending SIGTERM");
        self.terminate();
        if self.wait_for_exit(self.close_grace) {
            return Ok(CloseOutcome::Signalled);
        }

        tracing::warn!(session_id = %self.id, "guestfish ignored SIGTERM, killing");
        self.kill_quietly();
        Ok(CloseOutcome::Killed)
    }

    fn is_alive(&mut self) -> bool {
        self.alive && !self.has_exited()
    }

    fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }
}

impl Drop for InteractiveSession {
    fn drop(&mut self) {
        // Also reaps a child that exited without being waited on
        if !self.has_exited() {
            self.kill_quietly();
        }
    }
}
