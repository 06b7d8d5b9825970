//! Shared utility functions used across command modules.

use std::io::BufRead;
use std::path::Path;

use guestshell_core::config::{ConfigManager, Settings};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings, falling back to defaults when no file exists
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, CliError> {
    let manager = create_config_manager(config_path)?;
    manager
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
}

/// Parse a KEY=value pair
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Reads inner commands, one per line; blank lines and `#` comments are skipped
pub fn read_commands(reader: impl BufRead) -> Result<Vec<String>, CliError> {
    let mut commands = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        commands.push(trimmed.to_string());
    }
    Ok(commands)
}
