//! Structured logging setup.
//!
//! All crate code logs through `tracing`; the binary (or the embedding host) installs a
//! subscriber once at start-up with [`init_logging`]. The environment controls output:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `TOLLGATE_LOG_LEVEL` | `info` | base level (`trace`..`error`) |
//! | `TOLLGATE_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `TOLLGATE_LOG_TARGET_FILTER` | unset | extra comma-separated `EnvFilter` directives |
//! | `TOLLGATE_LOG_INCLUDE_LOCATION` | `false` | include file and line numbers |
//!
//! `RUST_LOG`, when set, takes precedence over `TOLLGATE_LOG_LEVEL`.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub log_level: String,
    pub format: LogFormat,
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read the `TOLLGATE_LOG_*` variables from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("TOLLGATE_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("TOLLGATE_LOG_FORMAT")
                .map_or(defaults.format, |s| LogFormat::parse(&s)),
            target_filter: lookup("TOLLGATE_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: lookup("TOLLGATE_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    /// Human-friendly settings for local runs.
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: true,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// The `EnvFilter` this configuration describes.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                let directive = filter
                    .parse()
                    .map_err(|e| anyhow!("invalid log filter directive '{filter}': {e}"))?;
                env_filter = env_filter.add_directive(directive);
            }
        }
        Ok(env_filter)
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
