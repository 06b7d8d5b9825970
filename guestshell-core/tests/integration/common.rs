//! Shared helpers for the integration tests

use std::path::PathBuf;
use std::time::Duration;

use guestshell_core::{GuestfishConfig, RunMode, SessionCounter, SessionManager};

/// Path of the fake guestfish script, made executable
pub fn fake_guestfish() -> PathBuf {
    fixture("fake-guestfish.sh")
}

/// Path of a fixture script, made executable
pub fn fixture(name: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path)
            .expect("fixture exists")
            .permissions()
            .mode();
        if mode & 0o111 != 0o111 {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("fixture permissions can be set");
        }
    }

    path
}

/// Interactive configuration with short timeouts pointing at the fake
pub fn interactive_config() -> GuestfishConfig {
    GuestfishConfig::new()
        .with_guestfish_path(fake_guestfish().to_string_lossy())
        .with_disk("/images/fake.img")
        .with_read_only(true)
        .with_timeout(Duration::from_secs(5))
        .with_probe_timeout(Duration::from_secs(5))
        .with_startup_timeout(Duration::from_secs(10))
        .with_close_grace(Duration::from_millis(500))
}

/// Remote configuration pointing at the fake
pub fn remote_config() -> GuestfishConfig {
    interactive_config().with_mode(RunMode::Remote)
}

/// Opens a manager with its own counter
pub fn open(config: GuestfishConfig) -> (SessionManager, SessionCounter) {
    let counter = SessionCounter::new();
    let manager = SessionManager::with_counter(config, counter.clone()).expect("session opens");
    (manager, counter)
}
