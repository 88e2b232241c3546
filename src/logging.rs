//! Logging configuration for nestedtx.
//!
//! Uses the `tracing` framework. Events go to stderr so they never mix with
//! REPL output on stdout. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::session::{SessionError, SessionResult};

/// Log format style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format (default)
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level filter
    pub level: String,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LogConfig {
    /// Create config with info level
    pub fn info() -> Self {
        Self {
            level: "info".to_string(),
            ..Default::default()
        }
    }

    /// Create config with debug level
    pub fn debug() -> Self {
        Self {
            level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set log level filter
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    fn filter(&self) -> SessionResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| SessionError::InvalidConfig(format!("invalid log level '{}': {}", self.level, e)))
    }

    /// Initialize global logging with this configuration.
    ///
    /// Fails if the level is not a valid filter or a global subscriber is
    /// already installed.
    pub fn init(self) -> SessionResult<()> {
        let env_filter = self.filter()?;
        let registry = tracing_subscriber::registry().with(env_filter);

        let result = match self.format {
            LogFormat::Pretty => registry
                .with(fmt::layer().with_writer(std::io::stderr).pretty())
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().with_writer(std::io::stderr).compact())
                .try_init(),
        };

        result.map_err(|e| SessionError::InvalidConfig(format!("logging already initialized: {}", e)))
    }
}
