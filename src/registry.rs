//! Property registry
//!
//! Maps property names to transformer handlers. Outputs look handlers up on
//! every write, so registering or deregistering is observed by all outputs
//! that share the registry starting with their next message.

use crate::builtins;
use crate::error::{LogError, LogResult};
use crate::output::Level;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Transforms `(message, level, value)` into a new message
pub type PropertyHandler = Arc<dyn Fn(&str, Level, &Value) -> String + Send + Sync>;

/// Names that always exist but never carry a handler
pub const HARDCODED_PROPERTIES: [&str; 3] = ["destroy", "keep", "dateFormat"];

static GLOBAL_REGISTRY: Lazy<Arc<PropertyRegistry>> =
    Lazy::new(|| Arc::new(PropertyRegistry::with_builtins()));

/// Named transformer handlers plus the reserved names
#[derive(Default)]
pub struct PropertyRegistry {
    handlers: RwLock<HashMap<String, PropertyHandler>>,
}

impl PropertyRegistry {
    /// Empty registry; only the reserved names exist
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in transformers enabled for this build
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtins::install(&registry);
        registry
    }

    /// Process-wide registry used by constructors without an explicit one
    pub fn global() -> Arc<PropertyRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    pub fn register<F>(&self, name: &str, handler: F) -> LogResult<()>
    where
        F: Fn(&str, Level, &Value) -> String + Send + Sync + 'static,
    {
        self.register_handler(name, Arc::new(handler))
    }

    pub fn register_handler(&self, name: &str, handler: PropertyHandler) -> LogResult<()> {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(name) || Self::is_hardcoded_property(name) {
            return Err(LogError::PropertyExists {
                name: name.to_string(),
            });
        }
        handlers.insert(name.to_string(), handler);
        Ok(())
    }

    /// Removes every named handler. Stops at the first reserved name; names
    /// before it stay removed.
    pub fn deregister<I, S>(&self, names: I) -> LogResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for name in names {
            let name = name.as_ref();
            if Self::is_hardcoded_property(name) {
                return Err(LogError::PropertyProtected {
                    name: name.to_string(),
                });
            }
            handlers.remove(name);
        }
        Ok(())
    }

    pub fn get_handler(&self, name: &str) -> LogResult<PropertyHandler> {
        self.handler(name).ok_or_else(|| LogError::PropertyMissing {
            name: name.to_string(),
        })
    }

    pub(crate) fn handler(&self, name: &str) -> Option<PropertyHandler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn property_exists(&self, name: &str) -> bool {
        Self::is_hardcoded_property(name)
            || self
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }

    pub fn is_hardcoded_property(name: &str) -> bool {
        HARDCODED_PROPERTIES.contains(&name)
    }

    /// Drops every handler
    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Drops every handler and installs the built-ins again
    pub fn reset(&self) {
        self.clear();
        builtins::install(self);
    }

    /// Registered handler names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Registers a handler on the global registry
pub fn register<F>(name: &str, handler: F) -> LogResult<()>
where
    F: Fn(&str, Level, &Value) -> String + Send + Sync + 'static,
{
    PropertyRegistry::global().register(name, handler)
}

/// Deregisters handlers from the global registry
pub fn deregister<I, S>(names: I) -> LogResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PropertyRegistry::global().deregister(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(message: &str, _level: Level, _value: &Value) -> String {
        message.to_uppercase()
    }

    #[test]
    fn test_register_and_get_handler() {
        let registry = PropertyRegistry::new();
        registry.register("upper", upper).unwrap();

        let handler = registry.get_handler("upper").unwrap();
        assert_eq!(handler("abc", Level::Info, &Value::Null), "ABC");
        assert!(registry.property_exists("upper"));
    }

    #[test]
    fn test_register_existing_name_fails() {
        let registry = PropertyRegistry::new();
        registry.register("upper", upper).unwrap();

        let err = registry.register("upper", upper).unwrap_err();
        assert!(matches!(err, LogError::PropertyExists { ref name } if name == "upper"));

        for reserved in HARDCODED_PROPERTIES {
            assert!(matches!(
                registry.register(reserved, upper),
                Err(LogError::PropertyExists { .. })
            ));
        }
    }

    #[test]
    fn test_deregister_removes_handler() {
        let registry = PropertyRegistry::new();
        registry.register("upper", upper).unwrap();
        registry.deregister(["upper"]).unwrap();

        assert!(matches!(
            registry.get_handler("upper"),
            Err(LogError::PropertyMissing { .. })
        ));
        assert!(!registry.property_exists("upper"));

        // absent names are a no-op
        registry.deregister(["upper", "never-registered"]).unwrap();
    }

    #[test]
    fn test_reserved_names_are_protected() {
        let registry = PropertyRegistry::new();
        for reserved in HARDCODED_PROPERTIES {
            assert!(matches!(
                registry.deregister([reserved]),
                Err(LogError::PropertyProtected { ref name }) if name == reserved
            ));
            assert!(registry.property_exists(reserved));
            assert!(PropertyRegistry::is_hardcoded_property(reserved));
            assert!(registry.get_handler(reserved).is_err());
        }
        assert!(!PropertyRegistry::is_hardcoded_property("level"));
    }

    #[test]
    fn test_deregister_stops_at_protected_name() {
        let registry = PropertyRegistry::new();
        registry.register("a", upper).unwrap();
        registry.register("b", upper).unwrap();

        assert!(registry.deregister(["a", "keep", "b"]).is_err());
        assert!(!registry.property_exists("a"));
        assert!(registry.property_exists("b"));
    }

    #[test]
    fn test_clear_and_reset() {
        let registry = PropertyRegistry::with_builtins();
        registry.register("upper", upper).unwrap();
        assert!(registry.property_exists("level"));

        registry.clear();
        assert!(registry.names().is_empty());
        assert!(registry.property_exists("keep"));

        registry.reset();
        assert!(registry.property_exists("level"));
        assert!(!registry.property_exists("upper"));
    }
}
