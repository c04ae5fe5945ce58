//! # Structured Logging Module
//!
//! Environment-aware structured logging for lifecycle transitions and
//! registry membership changes.

use crate::config::{LogFormat, LoggingConfig};
use chrono::Utc;
use std::fmt;
use std::sync::OnceLock;
use tracing_subscriber::{fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific defaults
pub fn init_structured_logging() {
    let environment = get_environment();
    let config = LoggingConfig {
        level: get_log_level(&environment).to_string(),
        format: LogFormat::Pretty,
    };
    init_logging_with_config(&config);
}

/// Initialize structured logging from explicit configuration.
///
/// Only the first call installs a subscriber; later calls are no-ops. An already
/// installed global subscriber (e.g. from a test harness) is left in place.
pub fn init_logging_with_config(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

        let layer = match config.format {
            LogFormat::Pretty => subscriber_fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .boxed(),
            LogFormat::Json => subscriber_fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .boxed(),
        };

        let subscriber = tracing_subscriber::registry().with(layer.with_filter(filter));

        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var("CLUSTER_LIFECYCLE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
pub(crate) fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "test" => "debug",
        "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log a realized state change
pub fn log_state_transition(
    entity_type: &str,
    entity: &str,
    from_state: impl fmt::Display,
    to_state: impl fmt::Display,
    event: impl fmt::Display,
) {
    tracing::info!(
        entity_type = %entity_type,
        entity = %entity,
        from_state = %from_state,
        to_state = %to_state,
        event = %event,
        timestamp = %Utc::now().to_rfc3339(),
        "STATE_TRANSITION"
    );
}

/// Log an event that has no transition from the entity's current state
pub fn log_invalid_transition(
    entity_type: &str,
    entity: &str,
    current_state: impl fmt::Display,
    event: impl fmt::Display,
) {
    tracing::warn!(
        entity_type = %entity_type,
        entity = %entity,
        current_state = %current_state,
        event = %event,
        timestamp = %Utc::now().to_rfc3339(),
        "INVALID_TRANSITION"
    );
}

/// Log an event rejected because it names a different entity
pub fn log_misaddressed_event(
    entity_type: &str,
    entity: &str,
    addressee: &str,
    event: impl fmt::Display,
) {
    tracing::warn!(
        entity_type = %entity_type,
        entity = %entity,
        addressee = %addressee,
        event = %event,
        timestamp = %Utc::now().to_rfc3339(),
        "MISADDRESSED_EVENT"
    );
}

/// Log a raw state assignment made while restoring a snapshot
pub fn log_state_restored(
    entity_type: &str,
    entity: &str,
    previous_state: impl fmt::Display,
    restored_state: impl fmt::Display,
) {
    tracing::info!(
        entity_type = %entity_type,
        entity = %entity,
        previous_state = %previous_state,
        restored_state = %restored_state,
        timestamp = %Utc::now().to_rfc3339(),
        "STATE_RESTORED"
    );
}

/// Log a registry membership operation
pub fn log_registry_operation(
    operation: &str,
    registry: &str,
    key: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        registry = %registry,
        key = %key,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "REGISTRY_OPERATION"
    );
}
