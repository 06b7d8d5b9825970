//! Captured result of one command

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of a finished command
///
/// Produced by the process runner for one-shot tools and by the session
/// manager for inner commands. For the interactive transport `stderr` is
/// always empty, since the terminal merges both streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Command text as it was dispatched
    pub command: String,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Exit status; for inner commands 0 or 1 as decided by the classifier
    pub exit_status: i32,
    /// Wall-clock time spent waiting for the command
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl CommandResult {
    /// Creates a result
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_status: i32,
        duration: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
            duration,
        }
    }

    /// Returns true when the exit status is zero
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Standard output with surrounding whitespace removed
    #[must_use]
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Non-empty lines of standard output
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim_end).filter(|l| !l.is_empty())
    }

    /// Interprets single-word `true`/`false` output of guestfish predicates
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.stdout_trimmed() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "command: {}", self.command)?;
        writeln!(f, "exit status: {}", self.exit_status)?;
        writeln!(f, "duration: {:.3}s", self.duration.as_secs_f64())?;
        if !self.stdout.is_empty() {
            writeln!(f, "stdout:\n{}", self.stdout.trim_end())?;
        }
        if !self.stderr.is_empty() {
            writeln!(f, "stderr:\n{}", self.stderr.trim_end())?;
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
