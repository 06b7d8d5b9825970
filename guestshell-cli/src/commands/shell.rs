//! Persistent session command.

use std::io;
use std::path::Path;
use std::time::Duration;

use guestshell_core::config::GuestfishSettings;
use guestshell_core::{CommandResult, GuestfishConfig, RunMode, SessionError, SessionInfo, SessionManager};
use serde::Serialize;

use crate::cli::{OutputFormat, ShellArgs};
use crate::error::CliError;
use crate::util::{load_settings, read_commands};

/// JSON report of a shell run
#[derive(Serialize)]
struct ShellReport<'a> {
    session: Option<SessionInfo>,
    results: &'a [CommandResult],
    error: Option<String>,
}

/// Shell command handler
pub fn cmd_shell(config_path: Option<&Path>, args: ShellArgs) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let config = build_config(&settings.guestfish, &args);

    let commands = if args.commands.is_empty() {
        read_commands(io::stdin().lock())?
    } else {
        args.commands.clone()
    };
    if commands.is_empty() {
        return Err(CliError::Arguments("no inner commands given".to_string()));
    }

    let mut session = SessionManager::new(config)?;
    let mut results = Vec::with_capacity(commands.len());
    let mut failure: Option<CliError> = None;

    for command in &commands {
        match session.inner_cmd(command) {
            Ok(result) => {
                if args.format == OutputFormat::Text {
                    print!("{}", result.stdout);
                    if result.exit_status != 0 {
                        eprintln!("warning: '{command}' returned status {}", result.exit_status);
                    }
                }
                results.push(result);
            }
            Err(SessionError::CommandFailed { result }) => {
                if args.format == OutputFormat::Text {
                    print!("{}", result.stdout);
                }
                results.push(*result.clone());
                failure = Some(SessionError::CommandFailed { result }.into());
                break;
            }
            Err(e) => {
                tracing::error!(%command, %e, "Inner command failed");
                failure = Some(e.into());
                break;
            }
        }
    }

    let info = session.session_info();
    if let Some(outcome) = session.close_session() {
        tracing::info!(%outcome, "Session closed");
    }

    if args.format == OutputFormat::Json {
        let report = ShellReport {
            session: info,
            results: &results,
            error: failure.as_ref().map(ToString::to_string),
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Output(format!("Failed to serialize results: {e}")))?;
        println!("{json}");
    }

    failure.map_or(Ok(()), Err)
}

/// Session configuration from persisted settings and command-line overrides
fn build_config(settings: &GuestfishSettings, args: &ShellArgs) -> GuestfishConfig {
    let mut config = settings
        .to_config()
        .with_read_only(args.ro)
        .with_inspector(args.inspector);

    if let Some(ref path) = args.guestfish {
        config = config.with_guestfish_path(path);
    }
    if let Some(ref disk) = args.disk {
        config = config.with_disk(disk);
    }
    if let Some(ref domain) = args.domain {
        config = config.with_domain(domain.clone());
    }
    if let Some(ref uri) = args.uri {
        config = config.with_uri(uri.clone());
    }
    if let Some(ref spec) = args.mount {
        config = config.with_mount(spec.clone());
    }
    if args.remote {
        config = config.with_mode(RunMode::Remote);
    }
    if let Some(id) = args.attach {
        config = config.with_remote_id(id);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if args.strict {
        config = config.with_ignore_status(false);
    }
    for (key, value) in &args.env {
        config = config.with_env(key.clone(), value.clone());
    }
    config
}
