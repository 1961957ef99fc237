//! Core output contracts
//!
//! A [`Sink`] is the minimal thing that can receive finished messages. An
//! [`Output`] additionally owns properties and formats messages before they
//! reach a sink. Every output in this crate (objects, files, histories and
//! loggers) implements [`Output`], so they compose freely.

use crate::error::LogResult;
use crate::properties::{Properties, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Info, Level::Warn, Level::Error];

    /// Lowercase name handed to property handlers
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can receive finished messages.
///
/// `destroy` is optional; the default does nothing.
pub trait Sink: Send + Sync {
    fn info(&self, message: &str) -> LogResult<()>;

    fn warn(&self, message: &str) -> LogResult<()>;

    fn error(&self, message: &str) -> LogResult<()>;

    fn destroy(&self) -> LogResult<()> {
        Ok(())
    }

    /// Dispatch on level
    fn emit(&self, level: Level, message: &str) -> LogResult<()> {
        match level {
            Level::Info => self.info(message),
            Level::Warn => self.warn(message),
            Level::Error => self.error(message),
        }
    }
}

/// An entity exposing leveled writes plus property and destroy management
pub trait Output: Send + Sync {
    /// Formats `message` with `params` and writes it at `level`
    fn write(&self, level: Level, message: &str, params: &[Value]) -> LogResult<()>;

    /// Releases the output
    fn destroy(&self) -> LogResult<()>;

    /// Assigns properties, moving each to the front of the application order
    fn apply_props(&self, properties: &Properties) -> LogResult<()>;

    /// Removes properties by name or by predicate
    fn remove_props(&self, selectors: &[Selector]);
}

/// Chaining helpers available on every [`Output`], including trait objects.
///
/// ```ignore
/// output.prop(Properties::new().with("level", true))?
///     .info("listening on %s", &[json!(8080)])?
///     .warn("disk at %d%%", &[json!(91)])?;
/// ```
pub trait OutputExt: Output {
    fn info(&self, message: &str, params: &[Value]) -> LogResult<&Self> {
        self.write(Level::Info, message, params)?;
        Ok(self)
    }

    fn warn(&self, message: &str, params: &[Value]) -> LogResult<&Self> {
        self.write(Level::Warn, message, params)?;
        Ok(self)
    }

    fn error(&self, message: &str, params: &[Value]) -> LogResult<&Self> {
        self.write(Level::Error, message, params)?;
        Ok(self)
    }

    fn prop(&self, properties: impl Into<Properties>) -> LogResult<&Self> {
        self.apply_props(&properties.into())?;
        Ok(self)
    }

    fn unprop<I>(&self, selectors: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Into<Selector>,
    {
        let selectors: Vec<Selector> = selectors.into_iter().map(Into::into).collect();
        self.remove_props(&selectors);
        self
    }
}

impl<T: Output + ?Sized> OutputExt for T {}
