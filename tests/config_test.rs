mod common;

use common::{init_logging, list, read, test_registry};
use logchain::{LogConfig, LogError, Output, OutputExt};
use tempfile::tempdir;

#[tokio::test]
async fn test_build_logger_from_toml() {
    init_logging();
    let dir = tempdir().unwrap();
    let mut config = LogConfig::from_toml_str(
        r#"
[[outputs]]
kind = "file"
path = "app/main.log"
properties = { newline = true, custom = true }

[[outputs]]
kind = "history"
directory = "history"
"#,
    )
    .unwrap();
    config
        .apply_overrides_from([("LOGCHAIN_LOG_DIR", dir.path().to_str().unwrap())])
        .unwrap();

    let logger = config.build_with_registry(test_registry()).unwrap();
    assert_eq!(logger.len(), 2);
    logger.info("configured", &[]).unwrap();
    logger.destroy().unwrap();

    // the files are prepared in the background
    let main = dir.path().join("app").join("main.log");
    let history = dir.path().join("history");
    for _ in 0..200 {
        let written = std::fs::metadata(&main).map(|m| m.len() > 0).unwrap_or(false);
        if written && history.is_dir() && !list(&history).is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(read(&main), "success/configured\n");
    assert_eq!(list(&history).len(), 1);
}

#[tokio::test]
async fn test_build_rejects_unknown_properties() {
    let config = LogConfig::from_toml_str(
        "[[outputs]]\nkind = \"console\"\nproperties = { sparkle = true }",
    )
    .unwrap();

    let err = config.build_with_registry(test_registry()).err().unwrap();
    assert!(matches!(err, LogError::Config(_)));
}

#[test]
fn test_file_outputs_need_a_runtime() {
    let config = LogConfig::from_toml_str("[[outputs]]\nkind = \"file\"\npath = \"x.log\"").unwrap();
    let err = config.build_with_registry(test_registry()).err().unwrap();
    assert!(matches!(err, LogError::Runtime(_)));
}

#[test]
fn test_default_config_builds_console_logger() {
    let logger = LogConfig::default().build().unwrap();
    assert_eq!(logger.len(), 1);
}
