//! # logchain
//!
//! Composable log outputs with an ordered, runtime-pluggable chain of message
//! transformers.
//!
//! ## Core Components
//!
//! * `registry` - Named property handlers shared by outputs, with a global default
//! * `output` - The `Sink` and `Output` traits and the chaining extension
//! * `outputs` - Object, logger, file, history, memory and console outputs
//! * `builtins` - The `level`, `date` and `color` transformers
//! * `format` - printf-style message formatting
//! * `config` - TOML configuration for building a logger declaratively
//! * `error` - Error types and handling
//!
//! ## Architecture
//!
//! A sink only knows how to write a finished string. An [`ObjectOutput`] sits
//! in front of a sink and keeps a list of active properties; on every write
//! the message is formatted, then passed through the handler of each active
//! property, most recently assigned first. Handlers are looked up by name in a
//! [`PropertyRegistry`] at write time, so registering a handler takes effect
//! for every output sharing that registry.
//!
//! A [`Logger`] fans operations out to several outputs. File and history
//! outputs prepare their files on the tokio runtime and queue messages until
//! the file is ready.

pub mod builtins;
pub mod config;
pub mod error;
pub mod format;
pub mod output;
pub mod outputs;
pub mod properties;
pub mod registry;

// Re-export main types for convenience
pub use config::{ConfigError, LogConfig, OutputConfig};
pub use error::{LogError, LogResult};
pub use format::format_message;
pub use output::{Level, Output, OutputExt, Sink};
#[cfg(feature = "date")]
pub use outputs::{history, history_with_callback, open_history};
pub use outputs::{
    file, file_with_callback, logger, object, open_file, ConsoleSink, FileOptions, FileOutput,
    FileSink, Logger, MemorySink, ObjectOutput, OpenCallback, Writable,
};
pub use properties::{Properties, PropertyFilter, Selector};
pub use registry::{deregister, register, PropertyHandler, PropertyRegistry, HARDCODED_PROPERTIES};
