//! Built-in transformers
//!
//! `level` is always available. `date` needs the `date` feature (chrono) and
//! `color` needs the `color` feature (colored).

use crate::output::Level;
use crate::registry::PropertyRegistry;
use serde_json::Value;

/// Installs every built-in enabled for this build. Names already taken are
/// left alone.
pub(crate) fn install(registry: &PropertyRegistry) {
    let _ = registry.register("level", level);

    #[cfg(feature = "date")]
    let _ = registry.register("date", date);

    #[cfg(feature = "color")]
    let _ = registry.register("color", color);
}

/// Prefixes `[<level>] `
pub fn level(message: &str, level: Level, _value: &Value) -> String {
    format!("[{}] {}", level, message)
}

#[cfg(feature = "date")]
pub use date_transformer::{date, render_timestamp, validate_date_format, DEFAULT_DATE_FORMAT};

#[cfg(feature = "date")]
mod date_transformer {
    use crate::error::{LogError, LogResult};
    use crate::output::Level;
    use chrono::format::{Item, StrftimeItems};
    use chrono::Local;
    use serde_json::Value;

    /// Pattern used by `date` when no string value is given
    pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Rejects patterns chrono cannot render
    pub fn validate_date_format(format: &str) -> LogResult<()> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(LogError::InvalidDateFormat {
                format: format.to_string(),
            });
        }
        Ok(())
    }

    /// Current local time rendered with a validated pattern
    pub fn render_timestamp(format: &str) -> LogResult<String> {
        validate_date_format(format)?;
        Ok(Local::now().format(format).to_string())
    }

    /// Prefixes `[<timestamp>] `
    pub fn date(message: &str, _level: Level, value: &Value) -> String {
        let format = value.as_str().unwrap_or(DEFAULT_DATE_FORMAT);
        let stamp = render_timestamp(format).unwrap_or_else(|e| {
            log::warn!("{}, falling back to {}", e, DEFAULT_DATE_FORMAT);
            Local::now().format(DEFAULT_DATE_FORMAT).to_string()
        });
        format!("[{}] {}", stamp, message)
    }
}

#[cfg(feature = "color")]
pub use color_transformer::{color, stylize};

#[cfg(feature = "color")]
mod color_transformer {
    use crate::output::Level;
    use colored::{Color, ColoredString, Colorize};
    use serde_json::Value;

    /// `true` applies the defaults: info plain, warn yellow, error red. An
    /// object maps level names to style specifications; missing levels pass
    /// through unchanged.
    pub fn color(message: &str, level: Level, value: &Value) -> String {
        match value {
            Value::Object(styles) => match styles.get(level.as_str()).and_then(Value::as_str) {
                Some(spec) => stylize(message, spec),
                None => message.to_string(),
            },
            _ => match level {
                Level::Info => message.to_string(),
                Level::Warn => message.yellow().to_string(),
                Level::Error => message.red().to_string(),
            },
        }
    }

    /// Applies a whitespace-separated style specification such as
    /// `"bold red on_white"`. Unknown words are ignored.
    pub fn stylize(message: &str, spec: &str) -> String {
        let mut styled = ColoredString::from(message);
        for word in spec.split_whitespace() {
            styled = match word {
                "plain" | "none" => styled.clear(),
                "bold" => styled.bold(),
                "dimmed" => styled.dimmed(),
                "italic" => styled.italic(),
                "underline" => styled.underline(),
                "blink" => styled.blink(),
                "reversed" | "inverse" => styled.reversed(),
                "hidden" => styled.hidden(),
                "strikethrough" => styled.strikethrough(),
                other => match other.strip_prefix("on_") {
                    Some(background) => match background.parse::<Color>() {
                        Ok(c) => styled.on_color(c),
                        Err(()) => styled,
                    },
                    None => match other.parse::<Color>() {
                        Ok(c) => styled.color(c),
                        Err(()) => styled,
                    },
                },
            };
        }
        styled.to_string()
    }
}
