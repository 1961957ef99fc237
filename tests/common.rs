//! Common test utilities shared by the integration tests

#![allow(dead_code)]

use logchain::{FileOutput, MemorySink, ObjectOutput, Properties, PropertyRegistry};
use std::path::Path;
use std::sync::Arc;

/// Routes the crate's own diagnostics to the test output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Registry with the handlers most tests rely on
pub fn test_registry() -> Arc<PropertyRegistry> {
    let registry = PropertyRegistry::new();
    registry
        .register("custom", |m, _, _| format!("success/{}", m))
        .unwrap();
    registry
        .register("raw", |m, l, v| {
            format!("{}/{}/{}", l, m, v.as_str().unwrap_or_default())
        })
        .unwrap();
    registry
        .register("newline", |m, _, _| format!("{}\n", m))
        .unwrap();
    Arc::new(registry)
}

/// Memory sink wrapped with `properties` against `registry`
pub fn memory_output(
    properties: Properties,
    registry: &Arc<PropertyRegistry>,
) -> (Arc<MemorySink>, ObjectOutput) {
    let sink = Arc::new(MemorySink::new());
    let output = ObjectOutput::with_registry(sink.clone(), &properties, Arc::clone(registry))
        .expect("Failed to create object output");
    (sink, output)
}

/// Destroys `output` and waits for its file to be released
pub async fn finish(output: &FileOutput) {
    use logchain::Output;
    output.destroy().expect("Failed to destroy output");
    output.closed().await;
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("Failed to read log file")
}

/// Names of the entries in `dir`, sorted
pub fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
