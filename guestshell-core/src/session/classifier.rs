//! Output classification for guestfish commands
//!
//! The guestfish shell protocol carries no per-command exit code, so the
//! status of an inner command is inferred from its text. Each error marker is
//! a regex matched against every output line; any match means status 1.

use std::fmt::Debug;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigError, ConfigResult};

/// Marker libguestfs prints in front of every error
pub const DEFAULT_ERROR_MARKER: &str = r"libguestfs: error:\s*";

static DEFAULT_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_ERROR_MARKER).expect("DEFAULT_ERROR_MARKER is a valid regex pattern")
});

/// Decides the status of a command from its output
pub trait OutputClassifier: Debug + Send + Sync {
    /// Returns 0 for success, non-zero for failure
    fn classify(&self, output: &str) -> i32;
}

/// Classifier that fails any output with a line matching an error marker
#[derive(Debug, Clone)]
pub struct ErrorMarkerClassifier {
    markers: Vec<Regex>,
}

impl ErrorMarkerClassifier {
    /// Compiles the given marker patterns
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for the first pattern that does
    /// not compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> ConfigResult<Self> {
        let markers = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { markers })
    }

    /// Returns the marker patterns as strings
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.markers.iter().map(Regex::as_str).collect()
    }

    /// Returns the first line that matches a marker
    #[must_use]
    pub fn first_error_line<'a>(&self, output: &'a str) -> Option<&'a str> {
        output
            .lines()
            .find(|line| self.markers.iter().any(|m| m.is_match(line)))
    }
}

impl Default for ErrorMarkerClassifier {
    fn default() -> Self {
        Self {
            markers: vec![DEFAULT_MARKER_REGEX.clone()],
        }
    }
}

impl OutputClassifier for ErrorMarkerClassifier {
    fn classify(&self, output: &str) -> i32 {
        i32::from(self.first_error_line(output).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output_is_success() {
        let classifier = ErrorMarkerClassifier::default();
        assert_eq!(classifier.classify("false\n"), 0);
        assert_eq!(classifier.classify(""), 0);
    }

    #[test]
    fn test_error_marker_is_failure() {
        let classifier = ErrorMarkerClassifier::default();
        let output = "some output\nlibguestfs: error: mount: /dev/sda1: No such file\n";
        assert_eq!(classifier.classify(output), 1);
        assert_eq!(
            classifier.first_error_line(output),
            Some("libguestfs: error: mount: /dev/sda1: No such file")
        );
    }

    #[test]
    fn test_marker_matches_mid_line() {
        let classifier = ErrorMarkerClassifier::default();
        assert_eq!(classifier.classify("guestfish: libguestfs: error: x"), 1);
    }

    #[test]
    fn test_custom_markers() {
        let classifier = ErrorMarkerClassifier::new(&["^ERR:", "fatal"]).unwrap();
        assert_eq!(classifier.patterns(), vec!["^ERR:", "fatal"]);
        assert_eq!(classifier.classify("ok\nERR: nope"), 1);
        assert_eq!(classifier.classify("a fatal thing"), 1);
        assert_eq!(classifier.classify("not ERR: at start"), 0);
    }

    #[test]
    fn test_invalid_marker() {
        let err = ErrorMarkerClassifier::new(&["(unclosed"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_no_markers_never_fails() {
        let classifier = ErrorMarkerClassifier::new::<&str>(&[]).unwrap();
        assert_eq!(classifier.classify("libguestfs: error: x"), 0);
    }
}
