use http_json::{EndpointError, JsonConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::time::Duration;

fn default_level() -> String {
    "info".into()
}

fn default_prefix() -> String {
    "jsonpoll".into()
}

fn default_period_secs() -> u64 {
    10
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            sentry_dsn: None,
        }
    }
}

/// One polled module: a set of hosts sharing the same collector settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ModuleConfig {
    pub hosts: Vec<String>,
    /// Path used for hosts that do not carry one
    pub path: Option<String>,
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    /// Budget for one fetch, defaults to the period
    pub timeout_secs: Option<u64>,
    #[serde(flatten)]
    pub json: JsonConfig,
}

impl ModuleConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(self.period_secs))
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { index, reason };

        if self.hosts.is_empty() {
            return Err(invalid("no hosts configured".into()));
        }
        if self.period_secs == 0 {
            return Err(invalid("period_secs cannot be 0".into()));
        }
        if self.timeout_secs == Some(0) {
            return Err(invalid("timeout_secs cannot be 0".into()));
        }

        self.json
            .clone()
            .validate()
            .map_err(|e: ValidationError| invalid(e.to_string()))?;

        for host in &self.hosts {
            http_json::resolve_endpoint(host, self.path.as_deref())
                .map_err(|e: EndpointError| invalid(e.to_string()))?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    pub modules: Vec<ModuleConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.is_empty() {
            return Err(ConfigError::NoModules);
        }

        // sentry::init panics on a malformed DSN, reject it here instead
        if let Some(dsn) = &self.logging.sentry_dsn {
            dsn.parse::<sentry::types::Dsn>()
                .map_err(|e| ConfigError::InvalidDsn(e.to_string()))?;
        }

        for (index, module) in self.modules.iter().enumerate() {
            module.validate(index)?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("no modules configured")]
    NoModules,
    #[error("invalid sentry DSN: {0}")]
    InvalidDsn(String),
    #[error("invalid module #{index}: {reason}")]
    Invalid { index: usize, reason: String },
}
