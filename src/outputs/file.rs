//! File output handler
//!
//! [`file`] hands back an output immediately and prepares the file in the
//! background: missing parent directories are created, the file is opened in
//! append mode, and messages written in the meantime are queued and flushed
//! in order once the stream exists.

use crate::error::{LogError, LogResult};
use crate::output::{Level, Output, Sink};
use crate::outputs::logger::Writable;
use crate::outputs::object::ObjectOutput;
use crate::outputs::stream::{AppendStream, DEFAULT_HIGH_WATER_MARK};
use crate::properties::{Properties, Selector};
use crate::registry::PropertyRegistry;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};

/// Receives the output once its file is ready, or the error that stopped it
pub type OpenCallback = Box<dyn FnOnce(LogResult<FileOutput>) + Send + 'static>;

/// Construction options shared by file and history outputs
#[derive(Clone)]
pub struct FileOptions {
    /// Properties applied to the output at construction
    pub properties: Properties,
    /// Registry to resolve properties against; the global one when unset
    pub registry: Option<Arc<PropertyRegistry>>,
    /// Messages buffered before writes are parked for the drain task
    pub high_water_mark: usize,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            properties: Properties::new(),
            registry: None,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn properties(mut self, properties: impl Into<Properties>) -> Self {
        self.properties = properties.into();
        self
    }

    pub fn registry(mut self, registry: Arc<PropertyRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn high_water_mark(mut self, messages: usize) -> Self {
        self.high_water_mark = messages;
        self
    }
}

enum Phase {
    Unopened,
    Opening,
    Open(AppendStream),
    Destroyed,
    Failed(String),
}

struct FileState {
    phase: Phase,
    queue: VecDeque<String>,
    destroy_requested: bool,
}

/// Sink over a single append-mode file stream.
///
/// Single use: unopened → opening → open → destroyed, or failed when the
/// file cannot be prepared.
pub struct FileSink {
    state: Mutex<FileState>,
    high_water_mark: usize,
    closed: Arc<watch::Sender<bool>>,
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_WATER_MARK)
    }
}

impl FileSink {
    pub fn new(high_water_mark: usize) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            state: Mutex::new(FileState {
                phase: Phase::Unopened,
                queue: VecDeque::new(),
                destroy_requested: false,
            }),
            high_water_mark,
            closed: Arc::new(closed),
        }
    }

    /// Opens `path` for appending and flushes queued messages.
    ///
    /// Fails with [`LogError::AlreadyOpened`] on every call after the first.
    pub async fn open(&self, path: &Path) -> LogResult<()> {
        {
            let mut state = self.state();
            if !matches!(state.phase, Phase::Unopened) {
                return Err(LogError::AlreadyOpened);
            }
            state.phase = Phase::Opening;
        }

        let file = match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(LogError::Io(e));
            }
        };

        let mut state = self.state();
        if !matches!(state.phase, Phase::Opening) {
            return Err(LogError::AlreadyOpened);
        }
        let stream = AppendStream::spawn(file, path, self.high_water_mark, Arc::clone(&self.closed));
        log::debug!(
            "Opened {} with {} queued messages",
            path.display(),
            state.queue.len()
        );
        while let Some(message) = state.queue.pop_front() {
            stream.write(message)?;
        }

        if state.destroy_requested {
            stream.end()?;
            state.phase = Phase::Destroyed;
        } else {
            state.phase = Phase::Open(stream);
        }
        Ok(())
    }

    /// Puts the sink in the failed state; queued messages are dropped
    pub(crate) fn fail(&self, reason: &str) {
        let mut state = self.state();
        if !state.queue.is_empty() {
            log::warn!(
                "Dropping {} queued messages: {}",
                state.queue.len(),
                reason
            );
            state.queue.clear();
        }
        state.phase = Phase::Failed(reason.to_string());
        self.closed.send_replace(true);
    }

    /// True once the file is released after destruction, or opening failed
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the file is released after destruction, or opening
    /// failed. Never resolves for a sink that is never destroyed.
    pub async fn closed(&self) {
        let mut receiver = self.closed.subscribe();
        let _ = receiver.wait_for(|closed| *closed).await;
    }

    fn state(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, message: &str) -> LogResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        match &state.phase {
            Phase::Destroyed => Err(LogError::StreamClosed),
            _ if state.destroy_requested => Err(LogError::StreamClosing),
            Phase::Failed(reason) => Err(LogError::StreamFailed {
                reason: reason.clone(),
            }),
            Phase::Unopened | Phase::Opening => {
                state.queue.push_back(message.to_string());
                Ok(())
            }
            Phase::Open(stream) => stream.write(message.to_string()).map(|_| ()),
        }
    }
}

impl Sink for FileSink {
    fn info(&self, message: &str) -> LogResult<()> {
        self.write(message)
    }

    fn warn(&self, message: &str) -> LogResult<()> {
        self.write(message)
    }

    fn error(&self, message: &str) -> LogResult<()> {
        self.write(message)
    }

    fn destroy(&self) -> LogResult<()> {
        let mut state = self.state();
        if state.destroy_requested {
            return Err(LogError::StreamClosed);
        }
        match std::mem::replace(&mut state.phase, Phase::Destroyed) {
            Phase::Destroyed => Err(LogError::StreamClosed),
            Phase::Unopened => {
                state.phase = Phase::Unopened;
                state.destroy_requested = true;
                Ok(())
            }
            Phase::Opening => {
                state.phase = Phase::Opening;
                state.destroy_requested = true;
                Ok(())
            }
            Phase::Failed(_) => Ok(()),
            Phase::Open(stream) => stream.end(),
        }
    }
}

/// Output writing to one file. Clones share the same file and properties.
#[derive(Clone)]
pub struct FileOutput {
    output: ObjectOutput,
    sink: Arc<FileSink>,
    path: PathBuf,
}

impl FileOutput {
    fn new(path: PathBuf, options: &FileOptions) -> LogResult<Self> {
        let sink = Arc::new(FileSink::new(options.high_water_mark));
        let registry = options
            .registry
            .clone()
            .unwrap_or_else(PropertyRegistry::global);
        let output = ObjectOutput::with_registry(sink.clone(), &options.properties, registry)?;
        Ok(Self { output, sink, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sink(&self) -> &Arc<FileSink> {
        &self.sink
    }

    /// The property-carrying output in front of the file
    pub fn object(&self) -> &ObjectOutput {
        &self.output
    }

    /// See [`FileSink::closed`]
    pub async fn closed(&self) {
        self.sink.closed().await
    }
}

impl Output for FileOutput {
    fn write(&self, level: Level, message: &str, params: &[Value]) -> LogResult<()> {
        self.output.write(level, message, params)
    }

    fn destroy(&self) -> LogResult<()> {
        self.output.destroy()
    }

    fn apply_props(&self, properties: &Properties) -> LogResult<()> {
        self.output.apply_props(properties)
    }

    fn remove_props(&self, selectors: &[Selector]) {
        self.output.remove_props(selectors)
    }
}

impl From<FileOutput> for Writable {
    fn from(output: FileOutput) -> Self {
        Writable::output(output)
    }
}

/// Makes sure `dir` exists, creating missing levels from the first existing
/// ancestor down. Errors other than "not found" are returned untouched.
pub(crate) fn ensure_exists(dir: PathBuf) -> BoxFuture<'static, io::Result<()>> {
    async move {
        if dir.as_os_str().is_empty() {
            return Ok(());
        }
        match tokio::fs::metadata(&dir).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let Some(parent) = dir.parent() else {
                    return Err(e);
                };
                ensure_exists(parent.to_path_buf()).await?;
                match tokio::fs::create_dir(&dir).await {
                    Err(e) if e.kind() != io::ErrorKind::AlreadyExists => Err(e),
                    _ => {
                        log::debug!("Created directory {}", dir.display());
                        Ok(())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
    .boxed()
}

fn current_runtime() -> LogResult<Handle> {
    Handle::try_current().map_err(|e| LogError::Runtime(e.to_string()))
}

/// Builds the output and opens its file in the background, then hands the
/// outcome to `after`.
pub(crate) fn spawn_file<F, Fut>(path: PathBuf, options: &FileOptions, after: F) -> LogResult<FileOutput>
where
    F: FnOnce(LogResult<FileOutput>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let runtime = current_runtime()?;
    let output = FileOutput::new(path, options)?;

    let ready = output.clone();
    runtime.spawn(async move {
        let parent = ready.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let result = match ensure_exists(parent).await {
            Ok(()) => ready.sink.open(&ready.path).await,
            Err(e) => {
                ready.sink.fail(&e.to_string());
                Err(LogError::Io(e))
            }
        };
        after(result.map(|()| ready)).await;
    });

    Ok(output)
}

fn report_open_failure(result: LogResult<FileOutput>) {
    if let Err(e) = result {
        log::error!("Failed to open log output: {}", e);
    }
}

/// Opens an output to the file at `path`.
///
/// Returns at once; writes made before the file is ready are queued. Open
/// failures are logged and make later writes fail.
pub fn file(path: impl AsRef<Path>, options: FileOptions) -> LogResult<FileOutput> {
    file_with_callback(path, options, Box::new(report_open_failure))
}

/// Like [`file`], calling `callback` once the file is open or has failed
pub fn file_with_callback(
    path: impl AsRef<Path>,
    options: FileOptions,
    callback: OpenCallback,
) -> LogResult<FileOutput> {
    spawn_file(path.as_ref().to_path_buf(), &options, move |result| async move {
        callback(result)
    })
}

/// Opens an output to the file at `path` and waits until it is ready
pub async fn open_file(path: impl AsRef<Path>, options: FileOptions) -> LogResult<FileOutput> {
    let (sender, receiver) = oneshot::channel();
    file_with_callback(
        path,
        options,
        Box::new(move |result| {
            let _ = sender.send(result);
        }),
    )?;
    receiver.await.map_err(|_| LogError::StreamFailed {
        reason: "open task was cancelled".to_string(),
    })?
}
