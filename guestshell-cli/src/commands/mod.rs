//! Command handler modules for the CLI.

mod completions;
mod detect;
mod shell;
mod tool;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Shell(args) => shell::cmd_shell(config_path, args),
        Commands::Run { tool, args, strict } => tool::cmd_run(config_path, &tool, args, strict),
        Commands::Cat { target, path } => tool::cmd_cat(config_path, &target, &path),
        Commands::Ls {
            target,
            path,
            uri,
            long,
            recursive,
        } => tool::cmd_ls(
            config_path,
            &target,
            &path,
            uri.as_deref(),
            long,
            recursive,
        ),
        Commands::Df { target } => tool::cmd_df(config_path, &target),
        Commands::Detect { format } => detect::cmd_detect(format),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
