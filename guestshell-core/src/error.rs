//! Error types for `guestshell`
//!
//! Each concern has its own error enum and result alias. [`GuestError`]
//! aggregates them for callers that do not care which layer failed.

use std::time::Duration;

use thiserror::Error;

use crate::process::CommandResult;

/// Top-level error type for the core library
#[derive(Debug, Error)]
pub enum GuestError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Process execution error
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Tool error
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the aggregated error
pub type GuestResult<T> = std::result::Result<T, GuestError>;

/// Errors raised while loading, saving, or validating configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Regex in the configuration does not compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Settings file could not be parsed
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// Settings file could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// Settings file could not be read or written
    #[error("Settings I/O error: {0}")]
    Io(String),

    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised by the process runner
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The program could not be started
    #[error("Failed to spawn '{program}': {reason}")]
    SpawnFailed {
        /// Program that failed to start
        program: String,
        /// OS error text
        reason: String,
    },

    /// The process did not finish in time
    #[error("Command '{command}' timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Command line that timed out
        command: String,
        /// Allotted time
        timeout: Duration,
    },

    /// The process exited with a non-zero status and the caller asked for strictness
    #[error("Command '{}' failed with exit status {}", .result.command, .result.exit_status)]
    NonZeroExit {
        /// The captured result
        result: Box<CommandResult>,
    },

    /// The process was terminated by a signal
    #[error("Command '{0}' was terminated by a signal")]
    Terminated(String),

    /// I/O error while talking to the process
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for process operations
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Errors raised by guestfish sessions and the session manager
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session process could not be started
    #[error("Failed to start guestfish session: {0}")]
    StartFailed(String),

    /// The prompt did not reappear in time
    #[error("Timed out after {}s waiting for the guestfish prompt (command: '{command}')", .timeout.as_secs())]
    Timeout {
        /// Command that was being waited on
        command: String,
        /// Allotted time
        timeout: Duration,
        /// Output read before the deadline
        partial_output: String,
    },

    /// The session process exited while a command was in flight
    #[error("guestfish process terminated while running '{command}'")]
    ProcessTerminated {
        /// Command that was being waited on
        command: String,
        /// Output read before the process went away
        partial_output: String,
    },

    /// The command ran but its output carried an error marker
    #[error("guestfish command '{}' returned non-zero exit status {}", .result.command, .result.exit_status)]
    CommandFailed {
        /// The captured result
        result: Box<CommandResult>,
    },

    /// No session is open; call `new_session` first
    #[error("No active guestfish session, open a new session first")]
    NoActiveSession,

    /// The liveness probe after construction did not succeed
    #[error("Persistent guestfish session is not responding ('{command}' returned {status})")]
    ProbeFailed {
        /// Probe command
        command: String,
        /// Status returned by the probe
        status: i32,
    },

    /// A command line contains characters the line protocol cannot carry
    #[error("Invalid inner command: {0}")]
    InvalidCommand(String),

    /// The remote listener output did not contain a session id
    #[error("Could not find a remote session id in: {0}")]
    MissingRemoteId(String),

    /// Error from the process runner (remote transport)
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Configuration rejected when opening the session
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error on the session's terminal
    #[error("Session I/O error: {0}")]
    Io(String),
}

impl SessionError {
    /// Returns true for timeouts, whether raised by the PTY reader or the runner
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Process(ProcessError::Timeout { .. })
        )
    }

    /// Returns true if the backing process is gone
    #[must_use]
    pub const fn is_process_terminated(&self) -> bool {
        matches!(self, Self::ProcessTerminated { .. })
    }
}

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors raised by one-shot libguestfs tools
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The tool is not one of the supported libguestfs commands
    #[error("Command {0} is not supported by libguestfs yet")]
    Unsupported(String),

    /// The tool is supported but not installed on this host
    #[error("{0} is not installed on this host")]
    NotInstalled(String),

    /// Invalid tool arguments
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Tool name
        tool: String,
        /// What was wrong
        reason: String,
    },

    /// Error from the process runner
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Result type for tool operations
pub type ToolResult<T> = std::result::Result<T, ToolError>;
