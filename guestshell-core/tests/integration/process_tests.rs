//! Host process runner and one-shot helpers

use std::time::{Duration, Instant};

use guestshell_core::command::tools::{help_contains_option, parse_sysprep_operations};
use guestshell_core::tools::{Guestfish, VERSION_TIMEOUT_TEXT, version_of};
use guestshell_core::{GuestfishLaunch, ProcessCommand, ProcessError, ProcessRunner, ToolError};

use super::common::{fake_guestfish, fixture};

#[test]
fn test_timeout_kills_child() {
    let runner = ProcessRunner::new();
    let command = ProcessCommand::shell("sleep 10").with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let err = runner.run(&command).unwrap_err();
    assert!(matches!(err, ProcessError::Timeout { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_env_reaches_child() {
    let command = ProcessCommand::shell("printf %s \"$GUESTSHELL_TEST_VALUE\"")
        .env("GUESTSHELL_TEST_VALUE", "disk one");
    let result = ProcessRunner::new().run(&command).unwrap();
    assert_eq!(result.stdout, "disk one");
}

#[test]
fn test_strict_status() {
    let runner = ProcessRunner::new();
    let lenient = runner
        .run_shell("echo oops >&2; exit 4", Duration::from_secs(5), true)
        .unwrap();
    assert_eq!(lenient.exit_status, 4);
    assert_eq!(lenient.stderr, "oops\n");

    match runner.run_shell("exit 4", Duration::from_secs(5), false) {
        Err(ProcessError::NonZeroExit { result }) => assert_eq!(result.exit_status, 4),
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[test]
fn test_spawn_failure() {
    let command = ProcessCommand::new("/nonexistent/virt-cat");
    assert!(matches!(
        ProcessRunner::new().run(&command),
        Err(ProcessError::SpawnFailed { .. })
    ));
}

#[test]
fn test_complete_cmd_uses_remote_path() {
    // The fake answers one-shot commands in its --remote branch
    let launch = GuestfishLaunch::new().with_program(fake_guestfish());
    let guestfish = Guestfish::new(launch);

    let line = guestfish.command_line("--remote=1 is-config");
    assert!(line.ends_with("--remote=1 is-config"));

    let result = guestfish.complete_cmd("--remote=1 is-config").unwrap();
    assert_eq!(result.stdout, "false\n");
}

#[test]
fn test_complete_cmd_strict_failure() {
    let launch = GuestfishLaunch::new().with_program(fake_guestfish());
    let guestfish = Guestfish::new(launch).with_ignore_status(false);

    let err = guestfish.complete_cmd("--remote=1 fail nope").unwrap_err();
    assert!(
        matches!(err, ToolError::Process(ProcessError::NonZeroExit { .. })),
        "{err:?}"
    );
}

#[test]
fn test_help_option_and_sysprep_parsing() {
    let help = "Usage:\n  virt-cat [--options] -d domname file\n  -a|--add image   Add image\n  --format[=raw|..]\n  -v, --verbose    Verbose\n";
    assert!(help_contains_option("virt-cat", help, "-v").unwrap());
    assert!(help_contains_option("virt-cat", help, "--verbose").unwrap());
    assert!(!help_contains_option("virt-cat", help, "--add").unwrap());
    assert!(!help_contains_option("virt-cat", help, "--keys-from-stdin").unwrap());

    let ops = parse_sysprep_operations(
        "abrt-data * Remove the crash data generated by ABRT\nbash-history * Remove the bash history in the guest\n",
    );
    assert_eq!(ops.len(), 2);
    assert_eq!(
        ops.get("bash-history").map(String::as_str),
        Some("Remove the bash history in the guest")
    );
}

#[test]
fn test_version_of_reads_first_line() {
    assert_eq!(
        version_of(&fake_guestfish(), Duration::from_secs(5)).as_deref(),
        Some("guestfish 1.52.0")
    );
}

#[test]
fn test_version_check_does_not_hang() {
    let started = Instant::now();
    let version = version_of(&fixture("hang-version.sh"), Duration::from_millis(500));
    assert_eq!(version.as_deref(), Some(VERSION_TIMEOUT_TEXT));
    assert!(started.elapsed() < Duration::from_secs(10));
}
