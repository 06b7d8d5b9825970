//! Process runner for one-shot libguestfs tools and remote guestfish helpers

mod result;
mod runner;

pub use result::CommandResult;
pub use runner::{DEFAULT_TIMEOUT_SECS, ProcessCommand, ProcessRunner};
