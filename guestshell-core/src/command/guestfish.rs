//! guestfish launch command builder

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::quote::join_command_line;

/// Default guestfish executable name
pub const GUESTFISH: &str = "guestfish";

/// Environment variables that alter the guestfish prompt or output colouring
pub const GUESTFISH_COLOR_ENVS: &[&str] = &[
    "GUESTFISH_PS1",
    "GUESTFISH_OUTPUT",
    "GUESTFISH_RESTORE",
    "GUESTFISH_INIT",
];

/// How guestfish is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Interactive shell over a pseudo-terminal
    #[default]
    Interactive,
    /// `guestfish --listen` server driven by `guestfish --remote`
    Remote,
}

impl RunMode {
    /// Returns the mode name as used in settings files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Remote => "remote",
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive" => Ok(Self::Interactive),
            "remote" => Ok(Self::Remote),
            other => Err(format!("run mode should be remote or interactive, not '{other}'")),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for launching guestfish against a disk image or libvirt domain
///
/// In remote mode only `--listen` is passed; the drive options are applied
/// later through inner commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestfishLaunch {
    /// guestfish executable
    pub program: Option<PathBuf>,
    /// `-a disk`
    pub disk_img: Option<PathBuf>,
    /// `-d domain`
    pub libvirt_domain: Option<String>,
    /// `--ro`
    pub read_only: bool,
    /// `-i`
    pub inspector: bool,
    /// `-c uri`
    pub uri: Option<String>,
    /// `--mount spec`
    pub mount_options: Option<String>,
    /// Interactive or remote
    pub mode: RunMode,
}

impl GuestfishLaunch {
    /// Creates launch options with no drives
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the guestfish executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Adds a disk image (`-a`)
    #[must_use]
    pub fn with_disk(mut self, disk: impl Into<PathBuf>) -> Self {
        self.disk_img = Some(disk.into());
        self
    }

    /// Adds a libvirt domain (`-d`)
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.libvirt_domain = Some(domain.into());
        self
    }

    /// Opens drives read-only (`--ro`)
    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Enables automatic inspection and mounting (`-i`)
    #[must_use]
    pub const fn with_inspector(mut self, inspector: bool) -> Self {
        self.inspector = inspector;
        self
    }

    /// Sets the libvirt connection URI (`-c`)
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets a `--mount` specification such as `/dev/sda1:/`
    #[must_use]
    pub fn with_mount(mut self, spec: impl Into<String>) -> Self {
        self.mount_options = Some(spec.into());
        self
    }

    /// Sets the run mode
    #[must_use]
    pub const fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the executable to run
    #[must_use]
    pub fn program(&self) -> String {
        self.program
            .as_ref()
            .map_or_else(|| GUESTFISH.to_string(), |p| p.to_string_lossy().into_owned())
    }

    /// Builds the argument list (without the program)
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.mode == RunMode::Remote {
            args.push("--listen".to_string());
            return args;
        }

        if let Some(ref uri) = self.uri {
            args.push("-c".to_string());
            args.push(uri.clone());
        }
        if let Some(ref disk) = self.disk_img {
            args.push("-a".to_string());
            args.push(disk.to_string_lossy().into_owned());
        }
        if let Some(ref domain) = self.libvirt_domain {
            args.push("-d".to_string());
            args.push(domain.clone());
        }
        if self.read_only {
            args.push("--ro".to_string());
        }
        if self.inspector {
            args.push("-i".to_string());
        }
        if let Some(ref spec) = self.mount_options {
            args.push("--mount".to_string());
            args.push(spec.clone());
        }

        args
    }

    /// Builds the full argv, program first
    #[must_use]
    pub fn build_command(&self) -> Vec<String> {
        let mut cmd = vec![self.program()];
        cmd.extend(self.build_args());
        cmd
    }

    /// Renders the launch as a shell-safe command line (for logs and dry runs)
    #[must_use]
    pub fn command_line(&self) -> String {
        join_command_line(&self.program(), &self.build_args())
    }
}
