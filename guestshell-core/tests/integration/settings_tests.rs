//! Settings persistence feeding real sessions

use std::time::Duration;

use guestshell_core::{ConfigManager, RunMode, SessionCounter, SessionId, SessionManager, Settings};

use super::common::fake_guestfish;

#[test]
fn test_saved_settings_open_session() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::with_config_dir(dir.path().join("guestshell"));

    let mut settings = Settings::default();
    settings.guestfish.path = fake_guestfish().to_string_lossy().into_owned();
    settings.guestfish.mode = RunMode::Remote;
    settings.guestfish.timeout_secs = 7;
    manager.save_settings(&settings).unwrap();

    let loaded = manager.load_settings().unwrap();
    assert_eq!(loaded, settings);

    let config = loaded.guestfish.to_config();
    assert_eq!(config.timeout, Duration::from_secs(7));

    let mut session = SessionManager::with_counter(config, SessionCounter::new()).unwrap();
    assert_eq!(session.session_id(), Some(SessionId::Remote(4242)));
    assert_eq!(session.inner_cmd("is-config").unwrap().stdout, "false\n");
}

#[test]
fn test_settings_file_is_toml() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    manager.save_settings(&Settings::default()).unwrap();

    let text = std::fs::read_to_string(manager.settings_path()).unwrap();
    assert!(text.contains("[guestfish]"));
    assert!(text.contains("mode = \"interactive\""));
    assert!(text.contains("[logging]"));
}
