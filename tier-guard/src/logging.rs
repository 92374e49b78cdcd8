//! Logging configuration for tier-guard.
//!
//! The pipeline logs through `tracing`: one span per stage, `info!` when a
//! stage completes, `warn!` for anomalous rows and fallback thresholds.
//! Per-row and per-group detail is opt-in through [`LogConfig`], since a
//! large dataset would otherwise flood the output.

use tracing::Level;

/// Controls detail logging inside the pipeline.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter level for tier-guard targets when the subscriber is set up
    /// through [`setup::LoggingConfig::with_log_config`]. Row and group
    /// detail is emitted at debug level, so it only shows at `DEBUG` or finer.
    pub base_level: Level,
    /// Whether to log every classified row
    pub log_row_details: bool,
    /// Whether to log per-group threshold and test details
    pub log_group_details: bool,
    /// Maximum length for logged field values
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_row_details: false,
            log_group_details: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Logs every row, for debugging small datasets.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_row_details: true,
            log_group_details: true,
            max_field_length: 1024,
        }
    }

    /// Stage summaries only.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_row_details: false,
            log_group_details: false,
            max_field_length: 128,
        }
    }
}

/// Logs at debug level when per-row detail is enabled.
#[macro_export]
macro_rules! log_row {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_row_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs at debug level when per-group detail is enabled.
#[macro_export]
macro_rules! log_group {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_group_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a value to at most `max_chars` characters for logging.
pub fn truncate_field(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        None => value.to_string(),
        Some((end, _)) => format!("{}...(truncated)", &value[..end]),
    }
}

/// Subscriber installation.
pub mod setup {
    use tracing::Level;

    use super::LogConfig;
    use crate::error::{Result, TierError};

    /// Configuration for the global `tracing` subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything else
        pub level: Level,
        /// Log level for tier-guard
        pub tier_level: Level,
        /// Emit JSON lines instead of text
        pub json_format: bool,
        /// Filter directive overriding the levels above
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                tier_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON output, warnings from dependencies, info from tier-guard.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                tier_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                tier_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_tier_level(mut self, level: Level) -> Self {
            self.tier_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Takes the tier-guard level from a pipeline [`LogConfig`].
        pub fn with_log_config(mut self, log: &LogConfig) -> Self {
            self.tier_level = log.base_level;
            self
        }

        /// Builds the filter directive.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},tier_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.tier_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global fmt subscriber. `RUST_LOG` takes precedence over
    /// the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use tier_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TierError::internal(format!("failed to install subscriber: {e}")))
    }
}
