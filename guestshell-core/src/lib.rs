//! `guestshell` Core Library
//!
//! Drives the libguestfs command-line tools: a persistent guestfish session
//! that accepts inner commands one at a time, and one-shot `virt-*` tools.
//!
//! # Crate Structure
//!
//! - [`session`] - Persistent guestfish sessions (interactive PTY and `--listen`/`--remote`)
//! - [`command`] - Command-line builders for guestfish, inner commands and `virt-*` tools
//! - [`process`] - Host process runner with timeouts and captured output
//! - [`tools`] - Supported tool set, detection and one-shot execution
//! - [`config`] - Session configuration and persisted settings
//! - [`tracing`] - Logging setup and span conventions
//!
//! # Example
//!
//! ```no_run
//! use guestshell_core::{GuestfishConfig, SessionManager};
//!
//! let config = GuestfishConfig::new().with_disk("/images/vm.img").with_read_only(true);
//! let mut session = SessionManager::new(config)?;
//! session.launch()?;
//! let result = session.list_filesystems()?;
//! println!("{}", result.stdout);
//! # Ok::<(), guestshell_core::SessionError>(())
//! ```

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod error;
pub mod process;
pub mod session;
pub mod tools;
pub mod tracing;

pub use command::{GuestfishLaunch, InnerCommand, RunMode, Target, ToolCommand};
pub use config::{ConfigManager, GuestfishConfig, GuestfishSettings, LoggingSettings, Settings};
pub use error::{
    ConfigError, ConfigResult, GuestError, GuestResult, ProcessError, ProcessResult,
    SessionError, SessionResult, ToolError, ToolResult,
};
pub use process::{CommandResult, ProcessCommand, ProcessRunner};
pub use session::{
    CloseOutcome, ErrorMarkerClassifier, GuestfishShell, OutputClassifier, SessionCounter,
    SessionId, SessionInfo, SessionManager, SessionState,
};
pub use tools::{Guestfish, LibguestfsTool, ToolInfo, run_tool};
