//! Persistent guestfish sessions
//!
//! A session is one guestfish process (interactive, driven over a PTY) or one
//! `guestfish --listen` server (remote, driven with `--remote`). Both sit
//! behind [`GuestfishShell`]; [`SessionManager`] owns at most one of them and
//! runs inner commands through it.

pub mod classifier;
mod counter;
mod interactive;
mod manager;
mod operations;
mod remote;
mod shell;

pub use classifier::{ErrorMarkerClassifier, OutputClassifier};
pub use counter::SessionCounter;
pub use interactive::{InteractiveSession, clean_reply, normalize_output};
pub use manager::{PROBE_COMMAND, SessionInfo, SessionManager, SessionState};
pub use remote::{RemoteSession, parse_remote_id};
pub use shell::{CloseOutcome, GuestfishShell, SessionId, ShellOutput};
