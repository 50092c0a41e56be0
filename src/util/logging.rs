//! Logging setup for baton
//!
//! Console output goes to stderr so reports printed on stdout stay
//! machine-readable; `BATON_LOG_JSON=true` switches to JSON lines for log
//! collectors. Filtering honors `RUST_LOG` when set.

use std::env;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Rendering and filtering choices for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for baton's own events
    pub level: Level,
    /// Emit JSON lines instead of the human console format
    pub json: bool,
    /// Annotate events with file and line number
    pub with_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            with_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// JSON lines with source locations, for log collectors.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json: true,
            with_location: true,
        }
    }
}

/// Parses a level name, case-insensitively.
///
/// ```
/// use baton::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("warn"), Some(Level::WARN));
/// assert_eq!(parse_level("Debug"), Some(Level::DEBUG));
/// assert_eq!(parse_level("loud"), None);
/// ```
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn filter_for(level: Level) -> EnvFilter {
    let mut filter =
        EnvFilter::from_default_env().add_directive(format!("baton={level}").parse().unwrap());

    // Cap the HTTP stack at warn unless RUST_LOG takes over
    if env::var("RUST_LOG").is_err() {
        for directive in ["genai=warn", "hyper=warn", "reqwest=warn"] {
            filter = filter.add_directive(directive.parse().unwrap());
        }
    }

    filter
}

/// Installs the global subscriber. Only the first call takes effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(filter_for(config.level));
        let layer = fmt::layer()
            .with_target(true)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .with_writer(std::io::stderr);

        if config.json {
            registry.with(layer.json()).init();
        } else {
            registry.with(layer).init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `BATON_LOG_LEVEL` and `BATON_LOG_JSON`, then installs the
/// subscriber. Unset or unparseable values fall back to the defaults.
pub fn init_from_env() {
    let level = env::var("BATON_LOG_LEVEL")
        .ok()
        .and_then(|name| parse_level(&name))
        .unwrap_or(Level::INFO);

    let json = env::var("BATON_LOG_JSON")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        json,
        ..LoggingConfig::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("info"), Some(Level::INFO));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("error"), Some(Level::ERROR));
    }

    #[test]
    fn test_parse_level_is_case_insensitive() {
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level("Info"), Some(Level::INFO));
    }

    #[test]
    fn test_parse_level_rejects_unknown_names() {
        assert_eq!(parse_level("loud"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json);
        assert!(!config.with_location);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.json);
        assert!(config.with_location);
    }

    #[test]
    fn test_with_level() {
        let config = LoggingConfig::with_level(Level::TRACE);
        assert_eq!(config.level, Level::TRACE);
        assert!(!config.json);
    }
}
