//! One-shot libguestfs tool commands.

use std::path::Path;

use guestshell_core::command::tools::{virt_cat, virt_df, virt_ls};
use guestshell_core::{LibguestfsTool, Target, ToolCommand, run_tool};

use crate::error::CliError;
use crate::util::load_settings;

/// Run command handler
pub fn cmd_run(
    config_path: Option<&Path>,
    tool: &str,
    args: Vec<String>,
    strict: bool,
) -> Result<(), CliError> {
    let tool = LibguestfsTool::check(tool)?;
    execute(config_path, &ToolCommand::new(tool.as_str()).args(args), strict)
}

/// Cat command handler
pub fn cmd_cat(config_path: Option<&Path>, target: &str, path: &str) -> Result<(), CliError> {
    execute(config_path, &virt_cat(&Target::detect(target), path), true)
}

/// Ls command handler
pub fn cmd_ls(
    config_path: Option<&Path>,
    target: &str,
    path: &str,
    uri: Option<&str>,
    long: bool,
    recursive: bool,
) -> Result<(), CliError> {
    let mut extra = Vec::new();
    if long {
        extra.push("-l".to_string());
    }
    if recursive {
        extra.push("-R".to_string());
    }
    execute(
        config_path,
        &virt_ls(&Target::detect(target), path, uri, &extra),
        true,
    )
}

/// Df command handler
pub fn cmd_df(config_path: Option<&Path>, target: &str) -> Result<(), CliError> {
    execute(config_path, &virt_df(&Target::detect(target)), true)
}

/// Runs the tool, forwarding its output; a non-zero exit is a failure
fn execute(config_path: Option<&Path>, command: &ToolCommand, strict: bool) -> Result<(), CliError> {
    let debug = load_settings(config_path)?.guestfish.debug;
    tracing::debug!(command = %command.command_line(), "Running tool");

    let result = run_tool(command, true, debug)?;
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);

    if strict && result.exit_status != 0 {
        return Err(CliError::CommandFailed(format!(
            "{} exited with status {}",
            command.program, result.exit_status
        )));
    }
    Ok(())
}
