//! Fan-out logger
//!
//! A [`Logger`] forwards every operation to each of its members in order.
//! Each member applies its own property chain to the raw message.

use crate::error::{LogError, LogResult};
use crate::output::{Level, Output, Sink};
use crate::outputs::object::ObjectOutput;
use crate::properties::{Properties, Selector};
use crate::registry::PropertyRegistry;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Something a logger can write to
#[derive(Clone)]
pub enum Writable {
    /// Raw sink, wrapped into an [`ObjectOutput`] without properties
    Sink(Arc<dyn Sink>),
    /// Full output, kept as-is
    Output(Arc<dyn Output>),
}

impl Writable {
    pub fn sink(sink: Arc<dyn Sink>) -> Self {
        Writable::Sink(sink)
    }

    pub fn output<O: Output + 'static>(output: O) -> Self {
        Writable::Output(Arc::new(output))
    }

    fn into_output(self, registry: &Arc<PropertyRegistry>) -> Arc<dyn Output> {
        match self {
            Writable::Sink(sink) => Arc::new(ObjectOutput::wrap(sink, Arc::clone(registry))),
            Writable::Output(output) => output,
        }
    }
}

impl From<Arc<dyn Sink>> for Writable {
    fn from(sink: Arc<dyn Sink>) -> Self {
        Writable::Sink(sink)
    }
}

impl From<Arc<dyn Output>> for Writable {
    fn from(output: Arc<dyn Output>) -> Self {
        Writable::Output(output)
    }
}

impl From<ObjectOutput> for Writable {
    fn from(output: ObjectOutput) -> Self {
        Writable::output(output)
    }
}

impl From<Logger> for Writable {
    fn from(logger: Logger) -> Self {
        Writable::output(logger)
    }
}

/// Output that fans out to many members
pub struct Logger {
    members: RwLock<Vec<Arc<dyn Output>>>,
    registry: Arc<PropertyRegistry>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::with_registry(PropertyRegistry::global())
    }
}

impl Logger {
    pub fn new<I>(writables: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Writable>,
    {
        let logger = Self::default();
        logger.add(writables);
        logger
    }

    /// Empty logger whose raw sinks are wrapped against `registry`
    pub fn with_registry(registry: Arc<PropertyRegistry>) -> Self {
        Self {
            members: RwLock::new(Vec::new()),
            registry,
        }
    }

    /// Appends members, wrapping raw sinks
    pub fn add<I>(&self, writables: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Into<Writable>,
    {
        let added: Vec<Arc<dyn Output>> = writables
            .into_iter()
            .map(|w| w.into().into_output(&self.registry))
            .collect();
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(added);
        self
    }

    /// Keeps only the members that pass every filter
    pub fn remove(&self, filters: &[&dyn Fn(&dyn Output) -> bool]) -> &Self {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|member| filters.iter().all(|filter| filter(member.as_ref())));
        self
    }

    /// Calls `f` on every member in order
    pub fn outputs<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(&dyn Output),
    {
        for member in self.snapshot() {
            f(member.as_ref());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.members.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Members are cloned out so forwarding never holds the lock.
    fn snapshot(&self) -> Vec<Arc<dyn Output>> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `op` on every member; the first error wins
    fn forward<F>(&self, mut op: F) -> LogResult<()>
    where
        F: FnMut(&dyn Output) -> LogResult<()>,
    {
        let mut first_error: Option<LogError> = None;
        for member in self.snapshot() {
            if let Err(e) = op(member.as_ref()) {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    log::warn!("Additional logger member failed: {}", e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Output for Logger {
    fn write(&self, level: Level, message: &str, params: &[Value]) -> LogResult<()> {
        self.forward(|member| member.write(level, message, params))
    }

    fn destroy(&self) -> LogResult<()> {
        self.forward(|member| member.destroy())
    }

    fn apply_props(&self, properties: &Properties) -> LogResult<()> {
        self.forward(|member| member.apply_props(properties))
    }

    fn remove_props(&self, selectors: &[Selector]) {
        for member in self.snapshot() {
            member.remove_props(selectors);
        }
    }
}

/// Creates a logger over the given members
pub fn logger<I>(writables: I) -> Logger
where
    I: IntoIterator,
    I::Item: Into<Writable>,
{
    Logger::new(writables)
}
