mod common;

use common::{finish, init_logging, read, test_registry};
use logchain::{
    file, file_with_callback, open_file, FileOptions, LogError, Output, OutputExt, Properties,
};
use serde_json::json;
use tempfile::tempdir;
use tokio::sync::oneshot;

fn options() -> FileOptions {
    FileOptions::new().registry(test_registry())
}

#[tokio::test]
async fn test_file_creates_missing_directories() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("c").join("test.log");

    let output = open_file(&path, options()).await.unwrap();
    output.info("Hello!", &[]).unwrap();
    finish(&output).await;

    assert_eq!(read(&path), "Hello!");
}

#[tokio::test]
async fn test_writes_before_open_are_queued_in_order() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("queued.log");

    let output = file(&path, options()).unwrap();
    for i in 0..50 {
        output.info("%d|", &[json!(i)]).unwrap();
    }
    finish(&output).await;

    let expected: String = (0..50).map(|i| format!("{}|", i)).collect();
    assert_eq!(read(&path), expected);
}

#[tokio::test]
async fn test_backpressure_keeps_issue_order() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("pressure.log");

    let output = open_file(&path, options().high_water_mark(2)).await.unwrap();
    for i in 0..2000 {
        output.info("%d,", &[json!(i)]).unwrap();
    }
    finish(&output).await;

    let expected: String = (0..2000).map(|i| format!("{},", i)).collect();
    assert_eq!(read(&path), expected);
}

#[tokio::test]
async fn test_file_appends_and_applies_properties() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("props.log");
    std::fs::write(&path, "existing\n").unwrap();

    let output = open_file(
        &path,
        options().properties(Properties::new().with("newline", true).with("custom", true)),
    )
    .await
    .unwrap();
    output.warn("Hello!", &[]).unwrap();
    output.unprop(["custom"]).error("Bye", &[]).unwrap();
    finish(&output).await;

    assert_eq!(read(&path), "existing\nsuccess/Hello!\nBye\n");
}

#[tokio::test]
async fn test_callback_receives_ready_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("callback.log");
    let (sender, receiver) = oneshot::channel();

    let output = file_with_callback(
        &path,
        options(),
        Box::new(move |result| {
            let _ = sender.send(result.map(|ready| ready.path().to_path_buf()));
        }),
    )
    .unwrap();

    assert_eq!(receiver.await.unwrap().unwrap(), path);
    assert!(path.exists());
    finish(&output).await;
}

#[tokio::test]
async fn test_second_destroy_fails() {
    let dir = tempdir().unwrap();
    let output = open_file(dir.path().join("twice.log"), options()).await.unwrap();

    output.destroy().unwrap();
    assert!(matches!(output.destroy(), Err(LogError::StreamClosed)));
    assert!(matches!(output.info("late", &[]), Err(LogError::StreamClosed)));
}

#[tokio::test]
async fn test_destroy_disabled_keeps_file_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kept.log");
    let output = open_file(&path, options().properties(Properties::new().with("destroy", false)))
        .await
        .unwrap();

    output.destroy().unwrap();
    output.info("still here", &[]).unwrap();
    output.unprop(["destroy"]);
    finish(&output).await;

    assert_eq!(read(&path), "still here");
}

#[tokio::test]
async fn test_open_failure_reaches_callback_and_later_writes() {
    init_logging();
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();

    let path = blocker.join("sub").join("test.log");
    let err = open_file(&path, options()).await.err().unwrap();
    assert!(matches!(err, LogError::Io(_)));

    let output = file(&path, options()).unwrap();
    output.closed().await;
    assert!(matches!(
        output.info("never", &[]),
        Err(LogError::StreamFailed { .. })
    ));
}

#[tokio::test]
async fn test_unknown_property_fails_synchronously() {
    let dir = tempdir().unwrap();
    let err = file(
        dir.path().join("x.log"),
        options().properties(Properties::new().with("nope", true)),
    )
    .err()
    .unwrap();
    assert!(matches!(err, LogError::PropertyMissing { .. }));
}
