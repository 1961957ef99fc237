//! Configuration management for declaratively built loggers
//!
//! A [`LogConfig`] lists outputs in a TOML file. Environment variables can
//! relocate relative paths and override history retention before the outputs
//! are built into a [`Logger`].

use crate::error::LogResult;
use crate::outputs::console::ConsoleSink;
use crate::outputs::file::{file, FileOptions};
use crate::outputs::logger::{Logger, Writable};
use crate::outputs::object::ObjectOutput;
use crate::properties::Properties;
use crate::registry::PropertyRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Base directory for relative file and history paths
pub const ENV_LOG_DIR: &str = "LOGCHAIN_LOG_DIR";
/// Retention applied to every history output
pub const ENV_KEEP: &str = "LOGCHAIN_KEEP";

/// Main logging configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Outputs in the order the logger forwards to them
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

/// One output of the logger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    /// Standard output and standard error
    Console {
        #[serde(default)]
        properties: Properties,
    },
    /// Append-mode file
    File {
        path: PathBuf,
        #[serde(default)]
        properties: Properties,
    },
    /// Timestamped files in a directory
    History {
        directory: PathBuf,
        #[serde(default)]
        properties: Properties,
    },
}

impl OutputConfig {
    pub fn properties(&self) -> &Properties {
        match self {
            OutputConfig::Console { properties }
            | OutputConfig::File { properties, .. }
            | OutputConfig::History { properties, .. } => properties,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            OutputConfig::Console { .. } => "console",
            OutputConfig::File { .. } => "file",
            OutputConfig::History { .. } => "history",
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            outputs: vec![OutputConfig::Console {
                properties: Properties::new().with("level", true),
            }],
        }
    }
}

impl LogConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(std::env::vars())
    }

    /// Apply overrides from the given variables instead of the process
    /// environment
    pub fn apply_overrides_from<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_LOG_DIR => self.relocate(Path::new(value)),
                ENV_KEEP => {
                    let keep: u64 = value.trim().parse().map_err(|_| {
                        ConfigError::Invalid(format!("{} must be a non-negative integer, got '{}'", ENV_KEEP, value))
                    })?;
                    for output in &mut self.outputs {
                        if let OutputConfig::History { properties, .. } = output {
                            properties.insert("keep", keep);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn relocate(&mut self, base: &Path) {
        for output in &mut self.outputs {
            match output {
                OutputConfig::File { path, .. } if path.is_relative() => *path = base.join(&*path),
                OutputConfig::History { directory, .. } if directory.is_relative() => {
                    *directory = base.join(&*directory)
                }
                _ => {}
            }
        }
    }

    /// Checks every property against `registry` and the history settings
    /// against their expected types
    pub fn validate(&self, registry: &PropertyRegistry) -> Result<(), ConfigError> {
        for (index, output) in self.outputs.iter().enumerate() {
            for (name, _) in output.properties().iter() {
                if !registry.property_exists(name) {
                    return Err(ConfigError::Invalid(format!(
                        "{} output #{} uses unknown property '{}'",
                        output.kind(),
                        index,
                        name
                    )));
                }
            }

            if let OutputConfig::History { properties, .. } = output {
                validate_history(properties)?;
            }
        }
        Ok(())
    }

    /// Builds a logger over the configured outputs using the global registry.
    ///
    /// File and history outputs need a running tokio runtime.
    pub fn build(&self) -> LogResult<Logger> {
        self.build_with_registry(PropertyRegistry::global())
    }

    pub fn build_with_registry(&self, registry: Arc<PropertyRegistry>) -> LogResult<Logger> {
        self.validate(&registry)?;

        let logger = Logger::with_registry(Arc::clone(&registry));
        for output in &self.outputs {
            let writable: Writable = match output {
                OutputConfig::Console { properties } => ObjectOutput::with_registry(
                    Arc::new(ConsoleSink::new()),
                    properties,
                    Arc::clone(&registry),
                )?
                .into(),
                OutputConfig::File { path, properties } => {
                    file(path, file_options(properties, &registry))?.into()
                }
                OutputConfig::History {
                    directory,
                    properties,
                } => build_history(directory, file_options(properties, &registry))?,
            };
            logger.add([writable]);
        }

        log::debug!("Built logger with {} outputs", logger.len());
        Ok(logger)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn file_options(properties: &Properties, registry: &Arc<PropertyRegistry>) -> FileOptions {
    FileOptions::new()
        .properties(properties.clone())
        .registry(Arc::clone(registry))
}

#[cfg(feature = "date")]
fn validate_history(properties: &Properties) -> Result<(), ConfigError> {
    use crate::outputs::history::{date_format, keep_count};

    keep_count(properties).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    date_format(properties).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(())
}

#[cfg(not(feature = "date"))]
fn validate_history(_properties: &Properties) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(
        "history outputs need the `date` feature".to_string(),
    ))
}

#[cfg(feature = "date")]
fn build_history(directory: &Path, options: FileOptions) -> LogResult<Writable> {
    Ok(crate::outputs::history::history(directory, options)?.into())
}

#[cfg(not(feature = "date"))]
fn build_history(_directory: &Path, _options: FileOptions) -> LogResult<Writable> {
    Err(ConfigError::Invalid("history outputs need the `date` feature".to_string()).into())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
