//! One-shot libguestfs tools
//!
//! [`LibguestfsTool`] is the set of commands this crate knows how to drive.
//! Invocations are built in [`crate::command::tools`] and executed here with
//! [`run_tool`].

mod detect;
mod guestfish;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use detect::{
    ToolInfo, VERSION_CHECK_TIMEOUT, VERSION_TIMEOUT_TEXT, detect_all, detect_tool, version_of,
    which_binary,
};
pub use guestfish::Guestfish;

use crate::command::ToolCommand;
use crate::command::tools::{
    help, help_contains_option, parse_sysprep_operations, virt_sysprep_list_operations,
};
use crate::error::{ToolError, ToolResult};
use crate::process::{CommandResult, DEFAULT_TIMEOUT_SECS, ProcessCommand, ProcessRunner};
use crate::tracing::span_names;

/// Supported libguestfs commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LibguestfsTool {
    /// `libguestfs-test-tool`
    #[serde(rename = "libguestfs-test-tool")]
    TestTool,
    /// `guestfish`
    #[serde(rename = "guestfish")]
    Guestfish,
    /// `guestmount`
    #[serde(rename = "guestmount")]
    Guestmount,
    /// `virt-alignment-scan`
    #[serde(rename = "virt-alignment-scan")]
    AlignmentScan,
    /// `virt-cat`
    #[serde(rename = "virt-cat")]
    Cat,
    /// `virt-copy-in`
    #[serde(rename = "virt-copy-in")]
    CopyIn,
    /// `virt-copy-out`
    #[serde(rename = "virt-copy-out")]
    CopyOut,
    /// `virt-df`
    #[serde(rename = "virt-df")]
    Df,
    /// `virt-edit`
    #[serde(rename = "virt-edit")]
    Edit,
    /// `virt-filesystems`
    #[serde(rename = "virt-filesystems")]
    Filesystems,
    /// `virt-format`
    #[serde(rename = "virt-format")]
    Format,
    /// `virt-inspector`
    #[serde(rename = "virt-inspector")]
    Inspector,
    /// `virt-list-filesystems`
    #[serde(rename = "virt-list-filesystems")]
    ListFilesystems,
    /// `virt-list-partitions`
    #[serde(rename = "virt-list-partitions")]
    ListPartitions,
    /// `virt-ls`
    #[serde(rename = "virt-ls")]
    Ls,
    /// `virt-make-fs`
    #[serde(rename = "virt-make-fs")]
    MakeFs,
    /// `virt-rescue`
    #[serde(rename = "virt-rescue")]
    Rescue,
    /// `virt-resize`
    #[serde(rename = "virt-resize")]
    Resize,
    /// `virt-sparsify`
    #[serde(rename = "virt-sparsify")]
    Sparsify,
    /// `virt-sysprep`
    #[serde(rename = "virt-sysprep")]
    Sysprep,
    /// `virt-tar`
    #[serde(rename = "virt-tar")]
    Tar,
    /// `virt-tar-in`
    #[serde(rename = "virt-tar-in")]
    TarIn,
    /// `virt-tar-out`
    #[serde(rename = "virt-tar-out")]
    TarOut,
    /// `virt-win-reg`
    #[serde(rename = "virt-win-reg")]
    WinReg,
    /// `virt-inspector2`
    #[serde(rename = "virt-inspector2")]
    Inspector2,
}

impl LibguestfsTool {
    /// Every supported tool, in listing order
    pub const ALL: [Self; 25] = [
        Self::TestTool,
        Self::Guestfish,
        Self::Guestmount,
        Self::AlignmentScan,
        Self::Cat,
        Self::CopyIn,
        Self::CopyOut,
        Self::Df,
        Self::Edit,
        Self::Filesystems,
        Self::Format,
        Self::Inspector,
        Self::ListFilesystems,
        Self::ListPartitions,
        Self::Ls,
        Self::MakeFs,
        Self::Rescue,
        Self::Resize,
        Self::Sparsify,
        Self::Sysprep,
        Self::Tar,
        Self::TarIn,
        Self::TarOut,
        Self::WinReg,
        Self::Inspector2,
    ];

    /// Executable name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TestTool => "libguestfs-test-tool",
            Self::Guestfish => "guestfish",
            Self::Guestmount => "guestmount",
            Self::AlignmentScan => "virt-alignment-scan",
            Self::Cat => "virt-cat",
            Self::CopyIn => "virt-copy-in",
            Self::CopyOut => "virt-copy-out",
            Self::Df => "virt-df",
            Self::Edit => "virt-edit",
            Self::Filesystems => "virt-filesystems",
            Self::Format => "virt-format",
            Self::Inspector => "virt-inspector",
            Self::ListFilesystems => "virt-list-filesystems",
            Self::ListPartitions => "virt-list-partitions",
            Self::Ls => "virt-ls",
            Self::MakeFs => "virt-make-fs",
            Self::Rescue => "virt-rescue",
            Self::Resize => "virt-resize",
            Self::Sparsify => "virt-sparsify",
            Self::Sysprep => "virt-sysprep",
            Self::Tar => "virt-tar",
            Self::TarIn => "virt-tar-in",
            Self::TarOut => "virt-tar-out",
            Self::WinReg => "virt-win-reg",
            Self::Inspector2 => "virt-inspector2",
        }
    }

    /// Checks that `program` names a supported tool
    ///
    /// # Errors
    ///
    /// Returns `ToolError::Unsupported` otherwise.
    pub fn check(program: &str) -> ToolResult<Self> {
        program.parse()
    }
}

impl FromStr for LibguestfsTool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::Unsupported(s.to_string()))
    }
}

impl fmt::Display for LibguestfsTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs a tool invocation to completion
///
/// The invocation's own timeout applies, otherwise the runner default. With
/// `ignore_status` off a non-zero exit is an error.
///
/// # Errors
///
/// Returns an error if the program is not a supported tool or the process
/// cannot be run.
pub fn run_tool(command: &ToolCommand, ignore_status: bool, debug: bool) -> ToolResult<CommandResult> {
    LibguestfsTool::check(&command.program)?;
    run_unchecked(command, ignore_status, debug)
}

fn run_unchecked(command: &ToolCommand, ignore_status: bool, debug: bool) -> ToolResult<CommandResult> {
    let span = crate::trace_operation!(span_names::TOOL_RUN, program = %command.program);
    let _guard = span.enter();

    let timeout = command
        .timeout
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    let process = ProcessCommand::new(&command.program)
        .args(command.args.iter().cloned())
        .with_timeout(timeout)
        .with_ignore_status(ignore_status);

    let result = ProcessRunner::new().with_debug(debug).run(&process)?;
    tracing::debug!(status = result.exit_status, "Tool finished");
    Ok(result)
}

/// Returns `virt-inspector2` when installed, otherwise `virt-inspector`
#[must_use]
pub fn inspector_program() -> &'static str {
    if which_binary(LibguestfsTool::Inspector2.as_str()).is_some() {
        LibguestfsTool::Inspector2.as_str()
    } else {
        LibguestfsTool::Inspector.as_str()
    }
}

/// Lists the operations `virt-sysprep` can perform, name → description
///
/// # Errors
///
/// Returns an error if `virt-sysprep` cannot be run or fails.
pub fn sysprep_operations() -> ToolResult<BTreeMap<String, String>> {
    let result = run_tool(&virt_sysprep_list_operations(), false, false)?;
    Ok(parse_sysprep_operations(&result.stdout))
}

/// Checks whether `tool --help` documents `option`
///
/// # Errors
///
/// Returns an error if the tool is unsupported, `option` is malformed, or the
/// help text cannot be obtained.
pub fn tool_has_option(tool: &str, option: &str) -> ToolResult<bool> {
    LibguestfsTool::check(tool)?;
    let result = run_unchecked(&help(tool), true, false)?;
    option_in_help(tool, &result, option)
}

/// Some tools print usage on stderr, so both streams are searched
fn option_in_help(tool: &str, help_output: &CommandResult, option: &str) -> ToolResult<bool> {
    let text = format!("{}\n{}", help_output.stdout, help_output.stderr);
    help_contains_option(tool, &text, option)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_tools() {
        assert_eq!("virt-cat".parse::<LibguestfsTool>().unwrap(), LibguestfsTool::Cat);
        assert_eq!(
            "libguestfs-test-tool".parse::<LibguestfsTool>().unwrap(),
            LibguestfsTool::TestTool
        );
        for tool in LibguestfsTool::ALL {
            assert_eq!(tool.as_str().parse::<LibguestfsTool>().unwrap(), tool);
        }
    }

    #[test]
    fn test_unsupported_tool() {
        let err = LibguestfsTool::check("virt-unknown").unwrap_err();
        assert_eq!(err, ToolError::Unsupported("virt-unknown".to_string()));
        assert_eq!(
            err.to_string(),
            "Command virt-unknown is not supported by libguestfs yet"
        );
    }

    #[test]
    fn test_serde_names_match_executables() {
        let json = serde_json::to_string(&LibguestfsTool::WinReg).unwrap();
        assert_eq!(json, "\"virt-win-reg\"");
        let tool: LibguestfsTool = serde_json::from_str("\"virt-tar-out\"").unwrap();
        assert_eq!(tool, LibguestfsTool::TarOut);
    }

    #[test]
    fn test_run_tool_rejects_unsupported_program() {
        let command = ToolCommand::new("sh").arg("-c").arg("true");
        assert!(matches!(
            run_tool(&command, true, false),
            Err(ToolError::Unsupported(_))
        ));
    }

    #[test]
    fn test_tool_has_option_rejects_unsupported_tool() {
        assert_eq!(
            tool_has_option("virt-unknown", "--help"),
            Err(ToolError::Unsupported("virt-unknown".to_string()))
        );
    }

    #[test]
    fn test_option_in_help_searches_both_streams() {
        let help_output = CommandResult::new(
            "virt-df --help",
            "virt-df: display free space on virtual filesystems\n",
            "Options:\n  -h|--human-readable   Human-readable sizes\n  --csv  Output as CSV\n",
            0,
            Duration::ZERO,
        );
        assert!(option_in_help("virt-df", &help_output, "--csv").unwrap());
        assert!(option_in_help("virt-df", &help_output, "--uuid").is_ok_and(|found| !found));
        assert!(!option_in_help("virt-df", &help_output, "--keys-from-stdin").unwrap());
        assert!(option_in_help("virt-df", &help_output, "csv").is_err());
    }

    #[test]
    fn test_inspector_program_is_supported() {
        let program = inspector_program();
        assert!(LibguestfsTool::check(program).is_ok());
    }
}
