//! Transport abstraction shared by interactive and remote sessions

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionResult;

/// Identity of a guestfish session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionId {
    /// Interactive session owned by this process
    Local(Uuid),
    /// `guestfish --listen` server, identified by its `GUESTFISH_PID`
    Remote(u32),
}

impl SessionId {
    /// Creates a fresh local id
    #[must_use]
    pub fn new_local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    /// Returns true for remote sessions
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local:{id}"),
            Self::Remote(id) => write!(f, "remote:{id}"),
        }
    }
}

/// How a session ended when it was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// The process exited after `quit`
    Graceful,
    /// The process exited after SIGTERM
    Signalled,
    /// The process had to be killed
    Killed,
    /// The process was already gone
    AlreadyClosed,
}

impl CloseOutcome {
    /// Returns the outcome as a short string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Graceful => "graceful",
            Self::Signalled => "signalled",
            Self::Killed => "killed",
            Self::AlreadyClosed => "already_closed",
        }
    }
}

impl fmt::Display for CloseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw reply of a guestfish transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// 0 on success, 1 if the output carried an error marker
    pub status: i32,
    /// Cleaned output text
    pub output: String,
}

/// A live connection to guestfish that accepts inner commands
pub trait GuestfishShell: Send {
    /// Session identity
    fn id(&self) -> SessionId;

    /// Sends one inner command and waits for its reply
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Timeout` if no reply arrives in time and
    /// `SessionError::ProcessTerminated` if guestfish went away.
    fn send(&mut self, command: &str, timeout: Duration) -> SessionResult<ShellOutput>;

    /// Ends the session
    ///
    /// # Errors
    ///
    /// Returns an error if the session state cannot be determined.
    fn close(&mut self) -> SessionResult<CloseOutcome>;

    /// Returns false once the session is known to be gone
    fn is_alive(&mut self) -> bool;

    /// OS process id, for local sessions
    fn pid(&self) -> Option<u32> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::Remote(4242).to_string(), "remote:4242");
        assert!(SessionId::new_local().to_string().starts_with("local:"));
    }

    #[test]
    fn test_local_ids_are_unique() {
        assert_ne!(SessionId::new_local(), SessionId::new_local());
        assert!(!SessionId::new_local().is_remote());
        assert!(SessionId::Remote(1).is_remote());
    }

    #[test]
    fn test_close_outcome_serialization() {
        let json = serde_json::to_string(&CloseOutcome::AlreadyClosed).unwrap();
        assert_eq!(json, "\"already_closed\"");
        assert_eq!(CloseOutcome::Signalled.to_string(), "signalled");
    }
}
