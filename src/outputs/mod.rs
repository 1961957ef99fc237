//! Output handlers for different logging destinations
//!
//! This module contains implementations for the output types:
//! - Object output (any [`Sink`](crate::Sink) plus a property chain)
//! - Logger (fan-out over many outputs)
//! - File output (append-mode file with backpressure)
//! - History output (timestamped files with retention)
//! - Memory and console sinks

pub mod console;
pub mod file;
#[cfg(feature = "date")]
pub mod history;
pub mod logger;
pub mod memory;
pub mod object;
mod stream;

pub use console::ConsoleSink;
pub use file::{file, file_with_callback, open_file, FileOptions, FileOutput, FileSink, OpenCallback};
#[cfg(feature = "date")]
pub use history::{history, history_with_callback, open_history};
pub use logger::{logger, Logger, Writable};
pub use memory::MemorySink;
pub use object::{object, ObjectOutput};
pub use stream::DEFAULT_HIGH_WATER_MARK;
