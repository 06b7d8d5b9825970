//! Detection of installed libguestfs tools
//!
//! Looks each tool up on `PATH` and asks it for `--version`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use super::LibguestfsTool;
use crate::error::ProcessError;
use crate::process::{ProcessCommand, ProcessRunner};

/// Version check timeout (6 seconds)
///
/// Tools built on the appliance can be slow to start; a single hung tool
/// must not block detection of the others.
pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(6);

/// Reported when a tool exists but did not answer `--version` in time
pub const VERSION_TIMEOUT_TEXT: &str = "installed (timeout)";

/// Upper bound for the version text we keep
const MAX_VERSION_LEN: usize = 100;

/// Information about one tool on this host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    /// Tool
    pub tool: LibguestfsTool,
    /// Resolved binary, if found
    pub path: Option<PathBuf>,
    /// First line of `--version`
    pub version: Option<String>,
    /// Whether the binary was found
    pub installed: bool,
}

impl ToolInfo {
    /// A tool found at `path`
    #[must_use]
    pub const fn installed(tool: LibguestfsTool, path: PathBuf, version: Option<String>) -> Self {
        Self {
            tool,
            path: Some(path),
            version,
            installed: true,
        }
    }

    /// A tool that could not be found
    #[must_use]
    pub const fn not_installed(tool: LibguestfsTool) -> Self {
        Self {
            tool,
            path: None,
            version: None,
            installed: false,
        }
    }
}

/// Detects one tool
#[must_use]
pub fn detect_tool(tool: LibguestfsTool) -> ToolInfo {
    let Some(path) = which_binary(tool.as_str()) else {
        tracing::debug!(%tool, "Tool not found on PATH");
        return ToolInfo::not_installed(tool);
    };
    let version = version_of(&path, VERSION_CHECK_TIMEOUT);
    ToolInfo::installed(tool, path, version)
}

/// Detects every supported tool
#[must_use]
pub fn detect_all() -> Vec<ToolInfo> {
    LibguestfsTool::ALL.into_iter().map(detect_tool).collect()
}

/// Finds `binary` on `PATH`; a name with a slash is checked as a path
#[must_use]
pub fn which_binary(binary: &str) -> Option<PathBuf> {
    which::which(binary).ok()
}

/// Runs `path --version` and returns the first line of its answer
///
/// Returns [`VERSION_TIMEOUT_TEXT`] if the tool does not exit within
/// `timeout`, and `None` if it cannot be run or prints nothing.
#[must_use]
pub fn version_of(path: &Path, timeout: Duration) -> Option<String> {
    let command = ProcessCommand::new(path.to_string_lossy())
        .arg("--version")
        .with_timeout(timeout)
        .with_ignore_status(true);

    match ProcessRunner::new().run(&command) {
        Ok(result) => parse_version(&result.stdout).or_else(|| parse_version(&result.stderr)),
        Err(ProcessError::Timeout { .. }) => {
            tracing::warn!(path = %path.display(), "Version check timed out");
            Some(VERSION_TIMEOUT_TEXT.to_string())
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), %e, "Version check failed");
            None
        }
    }
}

/// First non-empty line, capped in length
fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(MAX_VERSION_LEN).collect())
}
