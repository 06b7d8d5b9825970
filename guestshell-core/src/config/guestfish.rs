//! Typed configuration of a persistent guestfish session

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;

use crate::command::{GUESTFISH, GuestfishLaunch, RunMode};
use crate::error::{ConfigError, ConfigResult};
use crate::session::ErrorMarkerClassifier;
use crate::session::classifier::DEFAULT_ERROR_MARKER;

/// Prompt printed by interactive guestfish
pub const DEFAULT_PROMPT: &str = r"><fs>\s*";

/// Default timeout for one inner command in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;

/// Default timeout for the post-construction `is-config` probe in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

/// Default time to wait for the first prompt in seconds
///
/// `-i` launches the appliance before the prompt appears, which can be slow.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 120;

/// Default grace period between close escalation steps in seconds
pub const DEFAULT_CLOSE_GRACE_SECS: u64 = 5;

/// Configuration for a [`crate::session::SessionManager`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestfishConfig {
    /// `-a disk`
    pub disk_img: Option<PathBuf>,
    /// `--ro`
    pub read_only: bool,
    /// `-d domain`
    pub libvirt_domain: Option<String>,
    /// `-i`
    pub inspector: bool,
    /// `-c uri`
    pub uri: Option<String>,
    /// `--mount spec`
    pub mount_options: Option<String>,
    /// Interactive or remote transport
    pub mode: RunMode,
    /// guestfish executable
    pub guestfish_path: PathBuf,
    /// Regex recognizing the interactive prompt
    pub prompt: String,
    /// Regexes marking an error line in command output
    pub error_markers: Vec<String>,
    /// Timeout for one inner command
    pub timeout: Duration,
    /// Timeout for the liveness probe
    pub probe_timeout: Duration,
    /// Timeout for the first prompt
    pub startup_timeout: Duration,
    /// Grace period between quit, SIGTERM and SIGKILL
    pub close_grace: Duration,
    /// When false, a non-zero status becomes an error
    pub ignore_status: bool,
    /// Logs every command's output at debug level
    pub debug: bool,
    /// Extra environment for the guestfish process
    pub env: BTreeMap<String, String>,
    /// Attach to an already running `guestfish --listen` server
    pub remote_id: Option<u32>,
}

impl Default for GuestfishConfig {
    fn default() -> Self {
        Self {
            disk_img: None,
            read_only: false,
            libvirt_domain: None,
            inspector: false,
            uri: None,
            mount_options: None,
            mode: RunMode::Interactive,
            guestfish_path: PathBuf::from(GUESTFISH),
            prompt: DEFAULT_PROMPT.to_string(),
            error_markers: vec![DEFAULT_ERROR_MARKER.to_string()],
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            close_grace: Duration::from_secs(DEFAULT_CLOSE_GRACE_SECS),
            ignore_status: true,
            debug: false,
            env: BTreeMap::new(),
            remote_id: None,
        }
    }
}

impl GuestfishConfig {
    /// Creates a configuration with defaults and no drives
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the disk image; `~` is expanded
    #[must_use]
    pub fn with_disk(mut self, disk: impl AsRef<str>) -> Self {
        self.disk_img = Some(PathBuf::from(shellexpand::tilde(disk.as_ref()).into_owned()));
        self
    }

    /// Sets the libvirt domain
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.libvirt_domain = Some(domain.into());
        self
    }

    /// Opens drives read-only
    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Enables inspection and automatic mounting
    #[must_use]
    pub const fn with_inspector(mut self, inspector: bool) -> Self {
        self.inspector = inspector;
        self
    }

    /// Sets the libvirt connection URI
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets a `--mount` specification
    #[must_use]
    pub fn with_mount(mut self, spec: impl Into<String>) -> Self {
        self.mount_options = Some(spec.into());
        self
    }

    /// Sets the transport
    #[must_use]
    pub const fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the guestfish executable; `~` is expanded
    #[must_use]
    pub fn with_guestfish_path(mut self, path: impl AsRef<str>) -> Self {
        self.guestfish_path = PathBuf::from(shellexpand::tilde(path.as_ref()).into_owned());
        self
    }

    /// Sets the prompt regex
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Replaces the error markers
    #[must_use]
    pub fn with_error_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the command timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the probe timeout
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the startup timeout
    #[must_use]
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Sets the close grace period
    #[must_use]
    pub const fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Sets whether non-zero statuses are tolerated
    #[must_use]
    pub const fn with_ignore_status(mut self, ignore_status: bool) -> Self {
        self.ignore_status = ignore_status;
        self
    }

    /// Enables debug logging of command output
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Adds an environment variable for the guestfish process
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Attaches to an existing remote session instead of starting one
    #[must_use]
    pub const fn with_remote_id(mut self, id: u32) -> Self {
        self.remote_id = Some(id);
        self.mode = RunMode::Remote;
        self
    }

    /// Launch options derived from this configuration
    #[must_use]
    pub fn launch(&self) -> GuestfishLaunch {
        GuestfishLaunch {
            program: Some(self.guestfish_path.clone()),
            disk_img: self.disk_img.clone(),
            libvirt_domain: self.libvirt_domain.clone(),
            read_only: self.read_only,
            inspector: self.inspector,
            uri: self.uri.clone(),
            mount_options: self.mount_options.clone(),
            mode: self.mode,
        }
    }

    /// Compiles the prompt regex
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if the prompt does not compile.
    pub fn prompt_regex(&self) -> ConfigResult<Regex> {
        Regex::new(&self.prompt).map_err(|e| ConfigError::InvalidPattern {
            pattern: self.prompt.clone(),
            reason: e.to_string(),
        })
    }

    /// Builds the output classifier from the error markers
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if a marker does not compile.
    pub fn classifier(&self) -> ConfigResult<ErrorMarkerClassifier> {
        ErrorMarkerClassifier::new(&self.error_markers)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The prompt or an error marker is not a valid regex
    /// - The prompt is empty
    /// - A timeout is zero
    /// - A remote id is set for the interactive transport
    pub fn validate(&self) -> ConfigResult<()> {
        if self.prompt.is_empty() {
            return Err(ConfigError::Invalid("prompt pattern cannot be empty".to_string()));
        }
        self.prompt_regex()?;
        self.classifier()?;

        for (name, value) in [
            ("timeout", self.timeout),
            ("probe_timeout", self.probe_timeout),
            ("startup_timeout", self.startup_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }

        if self.remote_id.is_some() && self.mode != RunMode::Remote {
            return Err(ConfigError::Invalid(
                "an existing remote id requires the remote run mode".to_string(),
            ));
        }

        if self.guestfish_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("guestfish path cannot be empty".to_string()));
        }

        Ok(())
    }
}
