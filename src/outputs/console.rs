//! Console sink: info to stdout, warn and error to stderr

use crate::error::LogResult;
use crate::output::Sink;
use std::io::{self, Write};

/// Writes one message per line to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for ConsoleSink {
    fn info(&self, message: &str) -> LogResult<()> {
        writeln!(io::stdout().lock(), "{}", message)?;
        Ok(())
    }

    fn warn(&self, message: &str) -> LogResult<()> {
        writeln!(io::stderr().lock(), "{}", message)?;
        Ok(())
    }

    fn error(&self, message: &str) -> LogResult<()> {
        writeln!(io::stderr().lock(), "{}", message)?;
        Ok(())
    }
}
