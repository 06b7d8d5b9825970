//! Interactive sessions against the fake guestfish

use std::time::Duration;

use guestshell_core::session::PROBE_COMMAND;
use guestshell_core::{CloseOutcome, SessionCounter, SessionError, SessionManager, SessionState};

use super::common::{interactive_config, open};

#[test]
fn test_open_probes_and_counts() {
    let (mut manager, counter) = open(interactive_config());

    assert_eq!(counter.get(), 1);
    assert_eq!(manager.state(), SessionState::Open);
    assert!(manager.is_session_alive());

    let info = manager.session_info().expect("session info");
    assert!(!info.id.is_remote());
    assert!(info.pid.is_some());
    // The probe itself was dispatched
    assert_eq!(info.commands_sent, 1);

    assert_eq!(manager.close_session(), Some(CloseOutcome::Graceful));
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_inner_cmd_strips_echo_and_prompt() {
    let (mut manager, _counter) = open(interactive_config());

    let result = manager.inner_cmd("is-config").unwrap();
    assert_eq!(result.command, "is-config");
    assert_eq!(result.stdout, "false\n");
    assert_eq!(result.stderr, "");
    assert_eq!(result.exit_status, 0);

    let result = manager.version().unwrap();
    assert_eq!(result.stdout, "major: 1\nminor: 52\n");
}

#[test]
fn test_commands_share_one_process() {
    let (mut manager, _counter) = open(interactive_config());
    let pid = manager.session_info().unwrap().pid;

    for n in 0..5 {
        let line = format!("touch /tmp/file{n}");
        let result = manager.inner_cmd(&line).unwrap();
        assert_eq!(result.stdout, format!("ok: {line}\n"));
    }

    assert_eq!(manager.session_info().unwrap().pid, pid);
    assert_eq!(manager.session_info().unwrap().commands_sent, 6);
}

#[test]
fn test_typed_operation_quotes_arguments() {
    let (mut manager, _counter) = open(interactive_config());

    let result = manager.write("/etc/motd", "hello world").unwrap();
    assert_eq!(result.command, "write /etc/motd \"hello world\"");
    assert_eq!(result.stdout, "ok: write /etc/motd \"hello world\"\n");
}

#[test]
fn test_error_marker_ignored_by_default() {
    let (mut manager, _counter) = open(interactive_config());

    let result = manager.inner_cmd("fail no such file").unwrap();
    assert_eq!(result.exit_status, 1);
    assert!(result.stdout.contains("libguestfs: error: no such file"));
}

#[test]
fn test_error_marker_fails_when_strict() {
    let (mut manager, _counter) = open(interactive_config().with_ignore_status(false));

    match manager.inner_cmd("fail disk full") {
        Err(SessionError::CommandFailed { result }) => {
            assert_eq!(result.exit_status, 1);
            assert_eq!(result.command, "fail disk full");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }

    // The session survives a failed command
    assert_eq!(manager.inner_cmd("is-config").unwrap().stdout, "false\n");

    manager.set_ignore_status(true);
    assert_eq!(manager.inner_cmd("fail again").unwrap().exit_status, 1);
}

#[test]
fn test_empty_reply() {
    let (mut manager, _counter) = open(interactive_config());
    let result = manager.inner_cmd("").unwrap();
    assert_eq!(result.stdout, "");
    assert_eq!(result.exit_status, 0);
}

#[test]
fn test_line_breaks_rejected() {
    let (mut manager, _counter) = open(interactive_config());
    assert!(matches!(
        manager.inner_cmd("touch /a\ntouch /b"),
        Err(SessionError::InvalidCommand(_))
    ));
    // Nothing was sent
    assert_eq!(manager.session_info().unwrap().commands_sent, 1);
}

#[test]
fn test_timeout_keeps_process() {
    let (mut manager, counter) = open(interactive_config());
    manager.set_timeout(Duration::from_secs(1));

    let err = manager.inner_cmd("sleep 3").unwrap_err();
    assert!(err.is_timeout());
    match err {
        SessionError::Timeout { command, .. } => assert_eq!(command, "sleep 3"),
        other => panic!("expected Timeout, got {other:?}"),
    }

    assert!(manager.is_session_alive());
    assert_eq!(counter.get(), 1);
    manager.close_session();
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_command_after_timeout_gets_its_own_reply() {
    let (mut manager, _counter) = open(interactive_config());
    manager.set_timeout(Duration::from_secs(1));
    assert!(manager.inner_cmd("sleep 2").unwrap_err().is_timeout());

    manager.set_timeout(Duration::from_secs(5));
    let result = manager.inner_cmd("echo hi").unwrap();
    assert_eq!(result.stdout, "hi\n");
    assert_eq!(result.exit_status, 0);
    assert_eq!(manager.inner_cmd(PROBE_COMMAND).unwrap().stdout, "false\n");
}

#[test]
fn test_command_not_sent_while_timed_out_command_runs() {
    let (mut manager, counter) = open(interactive_config());
    manager.set_timeout(Duration::from_secs(1));
    assert!(manager.inner_cmd("sleep 3").unwrap_err().is_timeout());

    match manager.inner_cmd("echo early").unwrap_err() {
        SessionError::Timeout { command, .. } => assert_eq!(command, "echo early"),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(counter.get(), 1);

    manager.set_timeout(Duration::from_secs(5));
    assert_eq!(manager.inner_cmd("echo late").unwrap().stdout, "late\n");
}

#[test]
fn test_process_exit_then_no_session() {
    let (mut manager, counter) = open(interactive_config());

    let err = manager.inner_cmd("die").unwrap_err();
    assert!(err.is_process_terminated());

    assert!(matches!(
        manager.inner_cmd("is-config"),
        Err(SessionError::NoActiveSession)
    ));
    assert_eq!(counter.get(), 0);
    assert_eq!(manager.state(), SessionState::Closed);
    assert!(manager.session_id().is_none());

    // Nothing left to close
    assert_eq!(manager.close_session(), None);
}

#[cfg(unix)]
#[test]
fn test_external_kill_detected() {
    let (mut manager, counter) = open(interactive_config());
    let pid = manager.session_info().unwrap().pid.expect("pid");

    let status = std::process::Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .status()
        .unwrap();
    assert!(status.success());
    std::thread::sleep(Duration::from_millis(300));

    assert!(manager.inner_cmd("is-config").unwrap_err().is_process_terminated());
    assert!(matches!(
        manager.inner_cmd("is-config"),
        Err(SessionError::NoActiveSession)
    ));
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_new_session_replaces_old() {
    let (mut manager, counter) = open(interactive_config());
    let first = manager.session_id().unwrap();

    let second = manager.new_session().unwrap();
    assert_ne!(first, second);
    assert_eq!(manager.session_id(), Some(second));
    assert_eq!(counter.get(), 1);

    assert_eq!(manager.inner_cmd(PROBE_COMMAND).unwrap().stdout, "false\n");
}

#[test]
fn test_new_session_twice_keeps_count() {
    let (mut manager, counter) = open(interactive_config());
    let before = counter.get();

    let first = manager.new_session().unwrap();
    let second = manager.new_session().unwrap();
    assert_ne!(first, second);
    assert_eq!(counter.get(), before);
    assert_eq!(manager.inner_cmd("echo still here").unwrap().stdout, "still here\n");
}

#[test]
fn test_new_session_after_close() {
    let (mut manager, counter) = open(interactive_config());
    manager.close_session();
    assert!(matches!(
        manager.inner_cmd("is-config"),
        Err(SessionError::NoActiveSession)
    ));

    manager.new_session().unwrap();
    assert_eq!(counter.get(), 1);
    assert_eq!(manager.inner_cmd("echo back").unwrap().stdout, "back\n");
}

#[test]
fn test_close_is_idempotent() {
    let (mut manager, counter) = open(interactive_config());
    assert_eq!(manager.close_session(), Some(CloseOutcome::Graceful));
    assert_eq!(manager.close_session(), None);
    assert_eq!(counter.get(), 0);
}

/// True when `pid` is gone or not a zombie
#[cfg(target_os = "linux")]
fn reaped(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/status"))
        .map(|status| !status.lines().any(|l| l.starts_with("State:") && l.contains('Z')))
        .unwrap_or(true)
}

#[cfg(target_os = "linux")]
#[test]
fn test_graceful_close_reaps_process() {
    let (mut manager, _counter) = open(interactive_config());
    let pid = manager.session_info().unwrap().pid.expect("pid");

    assert_eq!(manager.close_session(), Some(CloseOutcome::Graceful));
    assert!(reaped(pid), "guestfish {pid} left as a zombie");
    drop(manager);
    assert!(reaped(pid), "guestfish {pid} left as a zombie");
}

#[cfg(target_os = "linux")]
#[test]
fn test_exited_process_is_reaped() {
    let (mut manager, _counter) = open(interactive_config());
    let pid = manager.session_info().unwrap().pid.expect("pid");

    assert!(manager.inner_cmd("die").unwrap_err().is_process_terminated());
    assert!(reaped(pid), "guestfish {pid} left as a zombie");
}

#[test]
fn test_close_escalates_to_sigterm() {
    let (mut manager, counter) =
        open(interactive_config().with_env("FAKE_GUESTFISH_IGNORE_QUIT", "1"));
    assert_eq!(manager.close_session(), Some(CloseOutcome::Signalled));
    assert_eq!(counter.get(), 0);
}

#[cfg(unix)]
#[test]
fn test_close_escalates_to_kill() {
    let config = interactive_config()
        .with_env("FAKE_GUESTFISH_IGNORE_QUIT", "1")
        .with_env("FAKE_GUESTFISH_IGNORE_TERM", "1");
    let (mut manager, counter) = open(config);
    assert_eq!(manager.close_session(), Some(CloseOutcome::Killed));
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_drop_closes_session() {
    let counter = SessionCounter::new();
    {
        let _manager = SessionManager::with_counter(interactive_config(), counter.clone()).unwrap();
        assert_eq!(counter.get(), 1);
    }
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_two_managers_share_counter() {
    let counter = SessionCounter::new();
    let mut first = SessionManager::with_counter(interactive_config(), counter.clone()).unwrap();
    let second = SessionManager::with_counter(interactive_config(), counter.clone()).unwrap();
    assert_eq!(counter.get(), 2);

    first.close_session();
    assert_eq!(counter.get(), 1);
    drop(second);
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_probe_failure_fails_construction() {
    let counter = SessionCounter::new();
    let config = interactive_config().with_env("FAKE_GUESTFISH_PROBE_FAIL", "1");

    match SessionManager::with_counter(config, counter.clone()) {
        Err(SessionError::ProbeFailed { command, status }) => {
            assert_eq!(command, "is-config");
            assert_eq!(status, 1);
        }
        other => panic!("expected ProbeFailed, got {other:?}"),
    }
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_start_failure_reported() {
    let counter = SessionCounter::new();
    let config = interactive_config().with_env("FAKE_GUESTFISH_BROKEN", "1");

    match SessionManager::with_counter(config, counter.clone()) {
        Err(SessionError::StartFailed(detail)) => {
            assert!(detail.contains("could not create appliance"), "{detail}");
        }
        other => panic!("expected StartFailed, got {other:?}"),
    }
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_missing_program_reported() {
    let config = interactive_config().with_guestfish_path("/nonexistent/guestfish");
    let err = SessionManager::with_counter(config, SessionCounter::new()).unwrap_err();
    assert!(matches!(err, SessionError::StartFailed(_)), "{err:?}");
}

#[test]
fn test_invalid_prompt_rejected() {
    let config = interactive_config().with_prompt("(unclosed");
    let err = SessionManager::with_counter(config, SessionCounter::new()).unwrap_err();
    assert!(matches!(err, SessionError::Config(_)), "{err:?}");
}

#[test]
fn test_custom_error_marker() {
    let config = interactive_config().with_error_markers(["^ok: rm "]);
    let (mut manager, _counter) = open(config);

    assert_eq!(manager.rm("/etc/passwd").unwrap().exit_status, 1);
    assert_eq!(manager.touch("/etc/passwd").unwrap().exit_status, 0);
    // The default marker is replaced
    assert_eq!(manager.inner_cmd("fail quietly").unwrap().exit_status, 0);
}
