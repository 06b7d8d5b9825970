//! Command-string builders
//!
//! Pure functions that map typed parameters to command lines: the guestfish
//! launch argv, guestfish inner commands, and one-shot `virt-*` tools. No
//! process is started here.

pub mod guestfish;
pub mod inner;
mod quote;
pub mod tools;

pub use guestfish::{GUESTFISH, GUESTFISH_COLOR_ENVS, GuestfishLaunch, RunMode};
pub use inner::InnerCommand;
pub use quote::{guestfish_quote, inner_line, join_command_line, shell_quote};
pub use tools::{Target, ToolCommand};
