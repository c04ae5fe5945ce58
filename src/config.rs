//! Configuration for the lifecycle core.
//!
//! Sources are layered in this order, later ones winning:
//!
//! 1. built-in defaults (environment detected from `CLUSTER_LIFECYCLE_ENV` / `APP_ENV`)
//! 2. an optional configuration file (format chosen by its extension)
//! 3. `CLUSTER_LIFECYCLE__*` environment variables, e.g.
//!    `CLUSTER_LIFECYCLE__LOGGING__LEVEL=info` or
//!    `CLUSTER_LIFECYCLE__CLUSTERS=c1,c2`

use crate::error::{LifecycleError, Result};
use crate::logging;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CLUSTER_LIFECYCLE";

const LEVEL_NAMES: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `cluster_lifecycle=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub environment: String,
    pub logging: LoggingConfig,
    /// Clusters registered when the cluster set is built from this configuration
    pub clusters: Vec<String>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            logging: LoggingConfig::default(),
            clusters: Vec::new(),
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from defaults, an optional file, and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment = logging::get_environment();
        let mut builder = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("logging.level", logging::get_log_level(&environment))?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: LifecycleConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("clusters"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::debug!(
            environment = %config.environment,
            clusters = config.clusters.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Reject configurations the registries could not honor
    pub fn validate(&self) -> Result<()> {
        if self.environment.trim().is_empty() {
            return Err(LifecycleError::Configuration(
                "environment must not be empty".to_string(),
            ));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(LifecycleError::Configuration(format!(
                "Invalid logging.level '{}': {e}",
                self.logging.level
            )));
        }

        // EnvFilter reads an unknown bare word as a target, so every directive
        // must still name a level.
        for directive in self.logging.level.split(',').map(str::trim) {
            if directive.is_empty() {
                continue;
            }
            let level = directive.rsplit('=').next().unwrap_or(directive);
            if !LEVEL_NAMES.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(LifecycleError::Configuration(format!(
                    "Invalid logging.level '{}': unknown level '{level}'",
                    self.logging.level
                )));
            }
        }

        let mut seen = HashSet::new();
        for name in &self.clusters {
            if name.trim().is_empty() {
                return Err(LifecycleError::Configuration(
                    "cluster names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(LifecycleError::Configuration(format!(
                    "cluster '{name}' is configured more than once"
                )));
            }
        }

        Ok(())
    }
}
