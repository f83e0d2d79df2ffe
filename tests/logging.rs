use rheedplot::error::LoggingError;
use rheedplot::logging::{self, LogConfig};

#[test]
fn init_writes_log_file_and_refuses_second_install() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LogConfig::new("rheed_test", dir.path().join("logs"));

    let path = logging::init(&cfg).unwrap();
    assert_eq!(path, cfg.file_path());
    tracing::warn!("camera disconnected");
    tracing::debug!("only in the file");

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Started rheed_test.log"));
    assert!(text.contains("camera disconnected"));
    assert!(text.contains("WARN"));

    let again = logging::init(&cfg);
    assert!(matches!(again, Err(LoggingError::AlreadyInstalled(_))));
    // The file was reopened in append mode; earlier lines are kept.
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Started rheed_test.log"));
}
