//! Persisted user settings

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::guestfish::{
    DEFAULT_CLOSE_GRACE_SECS, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_PROMPT, DEFAULT_STARTUP_TIMEOUT_SECS, GuestfishConfig,
};
use crate::command::{GUESTFISH, RunMode};
use crate::session::classifier::DEFAULT_ERROR_MARKER;

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Session defaults
    pub guestfish: GuestfishSettings,
    /// Logging defaults
    pub logging: LoggingSettings,
}

/// Defaults applied to every new guestfish session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestfishSettings {
    /// guestfish executable
    pub path: String,
    /// `interactive` or `remote`
    pub mode: RunMode,
    /// Prompt regex
    pub prompt: String,
    /// Error marker regexes
    pub error_markers: Vec<String>,
    /// Command timeout in seconds
    pub timeout_secs: u64,
    /// Probe timeout in seconds
    pub probe_timeout_secs: u64,
    /// Startup timeout in seconds
    pub startup_timeout_secs: u64,
    /// Close grace period in seconds
    pub close_grace_secs: u64,
    /// Tolerate non-zero statuses
    pub ignore_status: bool,
    /// Log command output at debug level
    pub debug: bool,
}

impl Default for GuestfishSettings {
    fn default() -> Self {
        Self {
            path: GUESTFISH.to_string(),
            mode: RunMode::Interactive,
            prompt: DEFAULT_PROMPT.to_string(),
            error_markers: vec![DEFAULT_ERROR_MARKER.to_string()],
            timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            close_grace_secs: DEFAULT_CLOSE_GRACE_SECS,
            ignore_status: true,
            debug: false,
        }
    }
}

impl GuestfishSettings {
    /// Session configuration seeded from these settings
    #[must_use]
    pub fn to_config(&self) -> GuestfishConfig {
        GuestfishConfig::new()
            .with_guestfish_path(&self.path)
            .with_mode(self.mode)
            .with_prompt(self.prompt.clone())
            .with_error_markers(self.error_markers.iter().cloned())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_probe_timeout(Duration::from_secs(self.probe_timeout_secs))
            .with_startup_timeout(Duration::from_secs(self.startup_timeout_secs))
            .with_close_grace(Duration::from_secs(self.close_grace_secs))
            .with_ignore_status(self.ignore_status)
            .with_debug(self.debug)
    }
}

/// Logging defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level used when no `-v` flag is given
    pub level: String,
    /// Optional log file; `~` is expanded
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl LoggingSettings {
    /// Log file with `~` expanded
    #[must_use]
    pub fn expanded_file(&self) -> Option<PathBuf> {
        self.file
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
    }
}
