//! CLI error types and exit codes.

use guestshell_core::{ConfigError, SessionError, ToolError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, arguments, unsupported tools
    pub const GENERAL_ERROR: i32 = 1;
    /// A guestfish session or a tool failed while running
    pub const COMMAND_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid arguments
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Tool is not supported
    #[error("{0}")]
    Unsupported(String),

    /// Session could not be opened or broke down
    #[error("Session error: {0}")]
    Session(String),

    /// An inner command or tool reported failure
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Output could not be serialized
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Config(e) => Self::Config(e.to_string()),
            SessionError::CommandFailed { result } => Self::CommandFailed(format!(
                "'{}' returned status {}",
                result.command, result.exit_status
            )),
            other => Self::Session(other.to_string()),
        }
    }
}

impl From<ToolError> for CliError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Unsupported(_) | ToolError::NotInstalled(_) => {
                Self::Unsupported(err.to_string())
            }
            ToolError::InvalidArguments { .. } => Self::Arguments(err.to_string()),
            ToolError::Process(e) => Self::CommandFailed(e.to_string()),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, arguments, unsupported tool, IO)
    /// - 2: Session or command failure
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Session(_) | Self::CommandFailed(_) => exit_codes::COMMAND_FAILURE,
            Self::Config(_)
            | Self::Arguments(_)
            | Self::Unsupported(_)
            | Self::Output(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
