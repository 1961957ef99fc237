//! Append-mode file stream with backpressure
//!
//! Messages travel over a bounded channel to a writer task that owns the
//! file. When the channel is full the stream reports backpressure and parks
//! the message in a pending queue. One drain task per stream feeds the queue
//! to the writer in FIFO order; while the queue is non-empty every new
//! message joins it, so delivery order always equals issue order.

use crate::error::{LogError, LogResult};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;

/// Buffered messages per stream before backpressure kicks in
pub const DEFAULT_HIGH_WATER_MARK: usize = 1024;

#[derive(Debug)]
enum Chunk {
    Data(String),
    End,
}

#[derive(Default)]
struct Backlog {
    pending: VecDeque<Chunk>,
    draining: bool,
}

pub(crate) struct AppendStream {
    path: PathBuf,
    sender: mpsc::Sender<Chunk>,
    backlog: Arc<Mutex<Backlog>>,
    runtime: Handle,
}

impl AppendStream {
    /// Starts the writer task for `file`. `closed` flips to true once the
    /// writer has flushed and released the file.
    pub(crate) fn spawn(
        file: File,
        path: &Path,
        high_water_mark: usize,
        closed: Arc<watch::Sender<bool>>,
    ) -> Self {
        let runtime = Handle::current();
        let (sender, receiver) = mpsc::channel(high_water_mark.max(1));
        runtime.spawn(run_writer(file, path.to_path_buf(), receiver, closed));

        Self {
            path: path.to_path_buf(),
            sender,
            backlog: Arc::new(Mutex::new(Backlog::default())),
            runtime,
        }
    }

    /// Returns `false` when the message was parked because of backpressure.
    /// It is still delivered, after everything issued before it.
    pub(crate) fn write(&self, message: String) -> LogResult<bool> {
        self.push(Chunk::Data(message))
    }

    /// Ends the stream once everything written before has been delivered
    pub(crate) fn end(&self) -> LogResult<()> {
        self.push(Chunk::End).map(|_| ())
    }

    fn push(&self, chunk: Chunk) -> LogResult<bool> {
        let mut backlog = lock(&self.backlog);
        if backlog.draining {
            backlog.pending.push_back(chunk);
            return Ok(false);
        }

        match self.sender.try_send(chunk) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(chunk)) => {
                log::debug!("Backpressure on {}, queueing writes", self.path.display());
                backlog.pending.push_back(chunk);
                backlog.draining = true;
                self.runtime.spawn(drain(
                    self.path.clone(),
                    self.sender.clone(),
                    Arc::clone(&self.backlog),
                ));
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => Err(LogError::StreamFailed {
                reason: format!("writer for {} has stopped", self.path.display()),
            }),
        }
    }
}

fn lock(backlog: &Mutex<Backlog>) -> MutexGuard<'_, Backlog> {
    backlog.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn drain(path: PathBuf, sender: mpsc::Sender<Chunk>, backlog: Arc<Mutex<Backlog>>) {
    loop {
        let next = {
            let mut backlog = lock(&backlog);
            match backlog.pending.pop_front() {
                Some(chunk) => chunk,
                None => {
                    backlog.draining = false;
                    return;
                }
            }
        };

        if sender.send(next).await.is_err() {
            let mut backlog = lock(&backlog);
            log::warn!(
                "Dropping {} queued messages for {}: writer has stopped",
                backlog.pending.len() + 1,
                path.display()
            );
            backlog.pending.clear();
            backlog.draining = false;
            return;
        }
    }
}

async fn run_writer(
    mut file: File,
    path: PathBuf,
    mut receiver: mpsc::Receiver<Chunk>,
    closed: Arc<watch::Sender<bool>>,
) {
    while let Some(chunk) = receiver.recv().await {
        match chunk {
            Chunk::Data(message) => {
                if let Err(e) = file.write_all(message.as_bytes()).await {
                    log::error!("Failed to write to {}: {}", path.display(), e);
                    break;
                }
            }
            Chunk::End => break,
        }
    }
    receiver.close();

    if let Err(e) = file.flush().await {
        log::error!("Failed to flush {}: {}", path.display(), e);
    }
    drop(file);
    log::debug!("Closed {}", path.display());
    closed.send_replace(true);
}
