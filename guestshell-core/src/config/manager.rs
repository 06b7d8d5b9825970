//! Loading and saving the settings file

use std::fs;
use std::path::{Path, PathBuf};

use super::Settings;
use crate::error::{ConfigError, ConfigResult};

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Application directory name under the user configuration directory
pub const APP_DIR: &str = "guestshell";

/// Reads and writes `settings.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses `<user config dir>/guestshell`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no
    /// configuration directory.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self {
            config_dir: base.join(APP_DIR),
        })
    }

    /// Uses a custom directory; `~` is expanded
    #[must_use]
    pub fn with_config_dir(dir: PathBuf) -> Self {
        let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
        Self {
            config_dir: PathBuf::from(expanded),
        }
    }

    /// Configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings, falling back to defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_settings(&self) -> ConfigResult<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("Failed to read '{}': {e}", path.display())))?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("'{}': {e}", path.display())))?;

        settings.guestfish.to_config().validate()?;
        Ok(settings)
    }

    /// Writes settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save_settings(&self, settings: &Settings) -> ConfigResult<()> {
        fs::create_dir_all(&self.config_dir).map_err(|e| {
            ConfigError::Io(format!(
                "Failed to create config directory '{}': {e}",
                self.config_dir.display()
            ))
        })?;

        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let path = self.settings_path();
        fs::write(&path, content)
            .map_err(|e| ConfigError::Io(format!("Failed to write '{}': {e}", path.display())))?;

        tracing::info!(path = %path.display(), "Settings saved");
        Ok(())
    }
}
