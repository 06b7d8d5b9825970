//! `guestshell` CLI - persistent guestfish sessions and libguestfs tools
//!
//! Runs inner commands through one long-lived guestfish process, wraps the
//! one-shot virt-* tools and reports which of them are installed.

mod cli;
mod commands;
mod error;
mod util;

use std::path::Path;

use clap::Parser;
use cli::Cli;
use guestshell_core::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if let Err(e) = init_tracing(&tracing_config(config_path, cli.verbose, cli.quiet)) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let result = commands::dispatch(config_path, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

/// Log setup from flags, falling back to the persisted logging settings
fn tracing_config(config_path: Option<&Path>, verbose: u8, quiet: bool) -> TracingConfig {
    if quiet {
        return TracingConfig::new().with_level(TracingLevel::Error);
    }
    if verbose > 0 {
        return TracingConfig::new().with_level(TracingLevel::from_verbosity(verbose));
    }

    let Ok(settings) = util::load_settings(config_path) else {
        return TracingConfig::new();
    };
    let level = settings.logging.level.parse().unwrap_or_default();
    let config = TracingConfig::new().with_level(level);
    match settings.logging.expanded_file() {
        Some(path) => config.with_output(TracingOutput::File(path)),
        None => config,
    }
}
