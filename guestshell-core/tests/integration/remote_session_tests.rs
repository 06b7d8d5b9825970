//! Remote (`--listen` / `--remote`) sessions against the fake guestfish

use guestshell_core::{
    CloseOutcome, SessionCounter, SessionError, SessionId, SessionManager, SessionState,
};

use super::common::{open, remote_config};

#[test]
fn test_listen_reports_id() {
    let (mut manager, counter) = open(remote_config().with_env("FAKE_GUESTFISH_REMOTE_ID", "5150"));

    assert_eq!(manager.session_id(), Some(SessionId::Remote(5150)));
    assert_eq!(counter.get(), 1);
    assert_eq!(manager.state(), SessionState::Open);
    assert!(manager.session_info().unwrap().pid.is_none());

    assert_eq!(manager.close_session(), Some(CloseOutcome::Graceful));
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_remote_command_output() {
    let (mut manager, _counter) = open(remote_config());

    let result = manager.inner_cmd("is-config").unwrap();
    assert_eq!(result.stdout, "false\n");
    assert_eq!(result.exit_status, 0);
    assert_eq!(result.command, "is-config");

    let result = manager.inner_cmd("mkdir-p /srv/data").unwrap();
    assert_eq!(result.stdout, "ok: mkdir-p /srv/data\n");
}

#[test]
fn test_remote_no_probe_on_open() {
    let (manager, _counter) = open(remote_config().with_env("FAKE_GUESTFISH_PROBE_FAIL", "1"));
    assert_eq!(manager.session_info().unwrap().commands_sent, 0);
}

#[test]
fn test_remote_failure_status() {
    let (mut manager, _counter) = open(remote_config());
    let result = manager.inner_cmd("fail remote broke").unwrap();
    assert_eq!(result.exit_status, 1);
    assert!(result.stdout.contains("libguestfs: error: remote broke"));
}

#[test]
fn test_remote_strict_failure() {
    let (mut manager, _counter) = open(remote_config().with_ignore_status(false));
    assert!(matches!(
        manager.inner_cmd("fail remote broke"),
        Err(SessionError::CommandFailed { .. })
    ));
}

#[test]
fn test_attach_existing_id() {
    let counter = SessionCounter::new();
    let mut manager =
        SessionManager::with_counter(remote_config().with_remote_id(77), counter.clone()).unwrap();

    assert_eq!(manager.session_id(), Some(SessionId::Remote(77)));
    assert_eq!(counter.get(), 1);
    assert_eq!(manager.inner_cmd("echo attached").unwrap().stdout, "attached\n");
}

#[test]
fn test_remote_quit_failure_is_already_closed() {
    let (mut manager, counter) = open(remote_config().with_env("FAKE_GUESTFISH_REMOTE_DEAD", "1"));
    assert_eq!(manager.close_session(), Some(CloseOutcome::AlreadyClosed));
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_listen_failure() {
    let counter = SessionCounter::new();
    let config = remote_config().with_env("FAKE_GUESTFISH_BROKEN", "1");
    let err = SessionManager::with_counter(config, counter.clone()).unwrap_err();
    assert!(matches!(err, SessionError::StartFailed(_)), "{err:?}");
    assert_eq!(counter.get(), 0);
}
