//! Output over an arbitrary sink
//!
//! An [`ObjectOutput`] owns the property assignments for one sink and folds
//! every outgoing message through their handlers, most recently assigned
//! first.

use crate::error::{LogError, LogResult};
use crate::format::format_message;
use crate::output::{Level, Output, Sink};
use crate::properties::{Properties, Selector};
use crate::registry::PropertyRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Active properties. `order` holds application order, front first.
#[derive(Default)]
struct PropertyState {
    order: Vec<String>,
    values: HashMap<String, Value>,
}

impl PropertyState {
    fn remove(&mut self, name: &str) {
        if self.values.remove(name).is_some() {
            self.order.retain(|active| active != name);
        }
    }
}

struct ObjectInner {
    sink: Arc<dyn Sink>,
    registry: Arc<PropertyRegistry>,
    state: Mutex<PropertyState>,
}

/// Cheaply cloneable handle; clones share sink and properties
#[derive(Clone)]
pub struct ObjectOutput {
    inner: Arc<ObjectInner>,
}

impl ObjectOutput {
    /// Wraps `sink` and applies `properties` against the global registry
    pub fn new(sink: Arc<dyn Sink>, properties: &Properties) -> LogResult<Self> {
        Self::with_registry(sink, properties, PropertyRegistry::global())
    }

    pub fn with_registry(
        sink: Arc<dyn Sink>,
        properties: &Properties,
        registry: Arc<PropertyRegistry>,
    ) -> LogResult<Self> {
        let output = Self::wrap(sink, registry);
        output.apply_props(properties)?;
        Ok(output)
    }

    /// Wraps `sink` without properties
    pub(crate) fn wrap(sink: Arc<dyn Sink>, registry: Arc<PropertyRegistry>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                sink,
                registry,
                state: Mutex::new(PropertyState::default()),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.inner.registry
    }

    /// Active properties in application order
    pub fn properties(&self) -> Vec<(String, Value)> {
        let state = self.state();
        state
            .order
            .iter()
            .filter_map(|name| state.values.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, PropertyState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Output for ObjectOutput {
    fn write(&self, level: Level, message: &str, params: &[Value]) -> LogResult<()> {
        let registry = &self.inner.registry;
        // Handlers run outside the lock so they may log through this output.
        let active = self.properties();

        let mut stale = Vec::new();
        let mut message = format_message(message, params);
        for (name, value) in &active {
            if PropertyRegistry::is_hardcoded_property(name) {
                continue;
            }
            match registry.handler(name) {
                Some(handler) => message = handler(&message, level, value),
                None => stale.push(name.as_str()),
            }
        }

        let result = self.inner.sink.emit(level, &message);

        if !stale.is_empty() {
            let mut state = self.state();
            for name in stale {
                log::debug!("Dropping property '{}' that is no longer registered", name);
                state.remove(name);
            }
        }
        result
    }

    fn destroy(&self) -> LogResult<()> {
        let keep_sink = matches!(self.state().values.get("destroy"), Some(Value::Bool(false)));
        if keep_sink {
            return Ok(());
        }
        self.inner.sink.destroy()
    }

    fn apply_props(&self, properties: &Properties) -> LogResult<()> {
        let mut state = self.state();
        for (name, value) in properties.iter() {
            if !self.inner.registry.property_exists(name) {
                return Err(LogError::PropertyMissing { name: name.clone() });
            }
            if state.values.contains_key(name) {
                state.order.retain(|active| active != name);
            }
            state.order.insert(0, name.clone());
            state.values.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn remove_props(&self, selectors: &[Selector]) {
        let mut state = self.state();
        for selector in selectors {
            match selector {
                Selector::Name(name) => state.remove(name),
                Selector::Filter(filter) => {
                    let matching: Vec<String> = state
                        .order
                        .iter()
                        .filter(|name| {
                            state
                                .values
                                .get(name.as_str())
                                .is_some_and(|value| filter(name.as_str(), value))
                        })
                        .cloned()
                        .collect();
                    for name in matching {
                        state.remove(&name);
                    }
                }
            }
        }
    }
}

/// Wraps `sink` into an output using the global registry
pub fn object(sink: Arc<dyn Sink>, properties: Properties) -> LogResult<ObjectOutput> {
    ObjectOutput::new(sink, &properties)
}
