//! Configuration management for `guestshell`
//!
//! [`GuestfishConfig`] is the typed configuration of one session.
//! [`Settings`] are the persisted defaults, loaded and saved as TOML by
//! [`ConfigManager`].

mod guestfish;
mod manager;
mod settings;

pub use guestfish::{
    DEFAULT_CLOSE_GRACE_SECS, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_PROMPT, DEFAULT_STARTUP_TIMEOUT_SECS, GuestfishConfig,
};
pub use manager::{APP_DIR, ConfigManager, SETTINGS_FILE};
pub use settings::{GuestfishSettings, LoggingSettings, Settings};
