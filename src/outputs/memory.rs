//! In-memory sink

use crate::error::LogResult;
use crate::output::{Level, Sink};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Records every message it receives, in order
#[derive(Default)]
pub struct MemorySink {
    buffer: Mutex<Vec<(Level, String)>>,
    destroyed: Mutex<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.buffer().clone()
    }

    /// Recorded messages for one level
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.buffer()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn last_message(&self) -> Option<String> {
        self.buffer().last().map(|(_, m)| m.clone())
    }

    /// Drains the recorded messages
    pub fn take(&self) -> Vec<(Level, String)> {
        std::mem::take(&mut *self.buffer())
    }

    /// How many times `destroy` was called
    pub fn destroy_count(&self) -> usize {
        *self.destroyed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<(Level, String)>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, level: Level, message: &str) -> LogResult<()> {
        self.buffer().push((level, message.to_string()));
        Ok(())
    }
}

impl Sink for MemorySink {
    fn info(&self, message: &str) -> LogResult<()> {
        self.record(Level::Info, message)
    }

    fn warn(&self, message: &str) -> LogResult<()> {
        self.record(Level::Warn, message)
    }

    fn error(&self, message: &str) -> LogResult<()> {
        self.record(Level::Error, message)
    }

    fn destroy(&self) -> LogResult<()> {
        *self.destroyed.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
