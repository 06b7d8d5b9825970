//! One-shot guestfish invocations
//!
//! `guestfish [options] <command>` starts a fresh appliance, runs a single
//! command and exits. Use [`crate::session::SessionManager`] when several
//! commands should share one appliance.

use std::time::Duration;

use crate::command::GuestfishLaunch;
use crate::error::{ToolError, ToolResult};
use crate::process::{CommandResult, DEFAULT_TIMEOUT_SECS, ProcessCommand, ProcessRunner};
use crate::tracing::span_names;

/// Runs complete guestfish command lines without a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guestfish {
    launch: GuestfishLaunch,
    timeout: Duration,
    ignore_status: bool,
    debug: bool,
}

impl Guestfish {
    /// Uses the given launch options
    #[must_use]
    pub fn new(launch: GuestfishLaunch) -> Self {
        Self {
            launch,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ignore_status: true,
            debug: false,
        }
    }

    /// Sets the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether a non-zero exit is tolerated
    #[must_use]
    pub const fn with_ignore_status(mut self, ignore_status: bool) -> Self {
        self.ignore_status = ignore_status;
        self
    }

    /// Logs full output of each run
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Shell line for `command`; the command keeps guestfish quoting
    #[must_use]
    pub fn command_line(&self, command: &str) -> String {
        format!("{} {}", self.launch.command_line(), command.trim())
    }

    /// Runs `guestfish [options] <command>`
    ///
    /// # Errors
    ///
    /// Returns `ToolError::InvalidArguments` for an empty command, or a
    /// process error if guestfish cannot be run.
    pub fn complete_cmd(&self, command: &str) -> ToolResult<CommandResult> {
        if command.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: self.launch.program(),
                reason: "no guestfish command given".to_string(),
            });
        }

        let span = crate::trace_operation!(span_names::TOOL_RUN, program = %self.launch.program());
        let _guard = span.enter();

        let process = ProcessCommand::shell(self.command_line(command))
            .with_timeout(self.timeout)
            .with_ignore_status(self.ignore_status);
        Ok(ProcessRunner::new().with_debug(self.debug).run(&process)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let guestfish = Guestfish::new(
            GuestfishLaunch::new()
                .with_disk("/images/vm.img")
                .with_read_only(true)
                .with_inspector(true),
        );
        assert_eq!(
            guestfish.command_line("cat /etc/hostname"),
            "guestfish -a /images/vm.img --ro -i cat /etc/hostname"
        );
    }

    #[test]
    fn test_empty_command_rejected() {
        let guestfish = Guestfish::new(GuestfishLaunch::new());
        assert!(matches!(
            guestfish.complete_cmd("   "),
            Err(ToolError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_complete_cmd_runs_program() {
        let guestfish = Guestfish::new(GuestfishLaunch::new().with_program("echo"));
        let result = guestfish.complete_cmd("version").unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_trimmed(), "version");
    }
}
