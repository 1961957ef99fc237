//! History output handler with retention
//!
//! Every call opens a fresh file named after the current time inside one
//! directory. With the `keep` property set, the oldest files in that
//! directory are deleted once the new file is open, leaving at most `keep`.

use crate::builtins::{render_timestamp, validate_date_format};
use crate::error::{LogError, LogResult};
use crate::outputs::file::{spawn_file, FileOptions, FileOutput, OpenCallback};
use crate::properties::Properties;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::oneshot;

/// File name pattern used when `dateFormat` is unset
pub const DEFAULT_HISTORY_FORMAT: &str = "%Y%m%d%H%M%S";

/// The `dateFormat` property, or the default pattern
pub fn date_format(properties: &Properties) -> LogResult<String> {
    let format = match properties.get("dateFormat") {
        None => DEFAULT_HISTORY_FORMAT.to_string(),
        Some(Value::String(format)) => format.clone(),
        Some(_) => return Err(LogError::invalid_type("dateFormat", "string")),
    };
    validate_date_format(&format)?;
    Ok(format)
}

/// The `keep` property as a file count
pub fn keep_count(properties: &Properties) -> LogResult<Option<usize>> {
    let Some(value) = properties.get("keep") else {
        return Ok(None);
    };
    let count = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .map(|n| n as u64)
    });
    match count {
        Some(count) => Ok(Some(count as usize)),
        None => Err(LogError::invalid_type("keep", "number")),
    }
}

/// Deletes the oldest entries of `directory` so at most `keep` remain.
/// Entries are ranked by modification time; ties keep listing order.
pub async fn rotate(directory: &Path, keep: usize) -> LogResult<()> {
    let rotation_error = |path: &Path, source| LogError::Rotation {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(directory)
        .await
        .map_err(|e| rotation_error(directory, e))?;
    let mut children = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| rotation_error(directory, e))?
    {
        children.push(entry.path());
    }

    if children.len() < keep {
        return Ok(());
    }
    let excess = children.len() - keep;

    let mut dated: Vec<(PathBuf, SystemTime)> = Vec::with_capacity(children.len());
    for child in children {
        let modified = tokio::fs::metadata(&child)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|e| rotation_error(child.as_path(), e))?;
        dated.push((child, modified));
    }
    dated.sort_by_key(|(_, modified)| *modified);

    for (path, _) in dated.into_iter().take(excess) {
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| rotation_error(path.as_path(), e))?;
        log::debug!("Removed old history file {}", path.display());
    }
    Ok(())
}

/// Opens an output to a new timestamped file in `directory`.
///
/// Open and rotation failures are logged and make later writes fail.
pub fn history(directory: impl AsRef<Path>, options: FileOptions) -> LogResult<FileOutput> {
    history_with_callback(
        directory,
        options,
        Box::new(|result| {
            if let Err(e) = result {
                log::error!("Failed to open history output: {}", e);
            }
        }),
    )
}

/// Like [`history`], calling `callback` once the file is open and old files
/// are rotated, or with the error that stopped either.
///
/// An invalid `dateFormat` is reported to `callback` and returned.
pub fn history_with_callback(
    directory: impl AsRef<Path>,
    options: FileOptions,
    callback: OpenCallback,
) -> LogResult<FileOutput> {
    let format = match date_format(&options.properties) {
        Ok(format) => format,
        Err(e) => {
            callback(Err(duplicate(&e)));
            return Err(e);
        }
    };

    let directory = directory.as_ref().to_path_buf();
    let file_name = directory.join(render_timestamp(&format)?);
    let properties = options.properties.clone();

    spawn_file(file_name, &options, move |result| async move {
        let output = match result {
            Ok(output) => output,
            Err(e) => return callback(Err(e)),
        };
        let rotated = match keep_count(&properties) {
            Ok(Some(keep)) => rotate(&directory, keep).await,
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        callback(rotated.map(|()| output));
    })
}

/// Opens a history output and waits until it is ready and rotated
pub async fn open_history(directory: impl AsRef<Path>, options: FileOptions) -> LogResult<FileOutput> {
    let (sender, receiver) = oneshot::channel();
    history_with_callback(
        directory,
        options,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    )?;
    receiver.await.map_err(|_| LogError::StreamFailed {
        reason: "open task was cancelled".to_string(),
    })?
}

// Configuration errors are reported twice: to the callback and to the caller.
fn duplicate(error: &LogError) -> LogError {
    match error {
        LogError::InvalidPropertyType { name, expected } => LogError::InvalidPropertyType {
            name: name.clone(),
            expected: *expected,
        },
        LogError::InvalidDateFormat { format } => LogError::InvalidDateFormat {
            format: format.clone(),
        },
        other => LogError::StreamFailed {
            reason: other.to_string(),
        },
    }
}
