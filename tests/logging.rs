use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn writes_log_file_and_ignores_second_init() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("logs").join("overlay.log");

    hunt_overlay::logging::init(true, Some(path.clone()));
    tracing::info!("overlay log probe");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).expect("read log");
    assert!(contents.contains("overlay log probe"));

    let other = dir.path().join("other.log");
    hunt_overlay::logging::init(false, None);
    tracing::info!("after second init");
    assert!(!other.exists(), "no second log file should appear");
}
