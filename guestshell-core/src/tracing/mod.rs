//! Structured logging setup
//!
//! The library only emits `tracing` events and spans. Binaries call
//! [`init_tracing`] once to install a `tracing-subscriber` formatter writing
//! to stderr or a file. `RUST_LOG` overrides the configured level.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Targets that receive the configured level
const CRATE_TARGETS: &[&str] = &["guestshell_core", "guestshell"];

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum TracingError {
    /// The subscriber could not be installed
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// A filter directive did not parse
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    /// Tracing was already initialized in this process
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,

    /// The log file could not be opened
    #[error("Failed to open log file '{}': {reason}", .path.display())]
    FileCreationFailed {
        /// Requested path
        path: PathBuf,
        /// OS error text
        reason: String,
    },
}

/// Result type for tracing setup
pub type TracingResult<T> = Result<T, TracingError>;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Errors and warnings
    #[default]
    Warn,
    /// Session lifecycle and settings changes
    Info,
    /// Every command and its status
    Debug,
    /// Everything
    Trace,
}

impl TracingLevel {
    /// Maps a `-v` count to a level, starting from `Warn`
    #[must_use]
    pub const fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(TracingError::InvalidFilter(s.to_string())),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        })
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard error
    #[default]
    Stderr,
    /// Append to a file, without ANSI colors
    File(PathBuf),
}

/// Subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TracingConfig {
    /// Level for this crate's targets
    pub level: TracingLevel,
    /// Destination
    pub output: TracingOutput,
    /// Full `EnvFilter` directive, overrides `level`
    pub filter: Option<String>,
}

impl TracingConfig {
    /// Default configuration: warnings to stderr
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the destination
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets a raw filter directive
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directive this configuration resolves to
    #[must_use]
    pub fn directive(&self) -> String {
        if let Some(ref filter) = self.filter {
            return filter.clone();
        }
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> TracingResult<EnvFilter> {
        if self.filter.is_none()
            && let Ok(from_env) = EnvFilter::try_from_default_env()
        {
            return Ok(from_env);
        }
        let directive = self.directive();
        EnvFilter::try_new(&directive).map_err(|_| TracingError::InvalidFilter(directive))
    }
}

/// Installs the global subscriber
///
/// # Errors
///
/// Returns an error if:
/// - Tracing has already been initialized
/// - The filter directive is invalid
/// - The log file cannot be opened
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = config.env_filter()?;

    match &config.output {
        TracingOutput::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        TracingOutput::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| TracingError::FileCreationFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(file),
                )
                .try_init()
        }
    }
    .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, "Tracing initialized");
    Ok(())
}

/// Checks whether [`init_tracing`] has run
#[must_use]
pub fn is_tracing_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}

/// Creates an info-level span for an operation
///
/// ```ignore
/// let span = guestshell_core::trace_operation!("session.command", command = %line);
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! trace_operation {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Span names used by this crate
pub mod span_names {
    /// Opening a session
    pub const SESSION_OPEN: &str = "session.open";
    /// Closing a session
    pub const SESSION_CLOSE: &str = "session.close";
    /// One inner command
    pub const SESSION_COMMAND: &str = "session.command";
    /// A host process run
    pub const PROCESS_RUN: &str = "process.run";
    /// A one-shot tool run
    pub const TOOL_RUN: &str = "tool.run";
}
