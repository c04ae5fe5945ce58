//! Error types for the lifecycle core.
//!

use std::fmt;
use thiserror::Error;

/// Kind of entity a registry error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Host,
    ServiceComponentHost,
    Cluster,
    Job,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::ServiceComponentHost => write!(f, "service component host"),
            Self::Cluster => write!(f, "cluster"),
            Self::Job => write!(f, "job"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Duplicate {entity_type}: {key}")]
    DuplicateEntity { entity_type: EntityType, key: String },
    #[error("{entity_type} not found: {key}")]
    NotFound { entity_type: EntityType, key: String },
    #[error("Invalid event {event_kind} for {entity} in state {current_state}")]
    InvalidTransition {
        entity: String,
        current_state: String,
        event_kind: String,
    },
    #[error("Event addressed to {addressee} delivered to {entity}")]
    MisaddressedEvent { entity: String, addressee: String },
    #[error("Malformed topology: {0}")]
    MalformedTopology(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LifecycleError {
    pub fn duplicate(entity_type: EntityType, key: impl Into<String>) -> Self {
        Self::DuplicateEntity {
            entity_type,
            key: key.into(),
        }
    }

    pub fn misaddressed(entity: impl Into<String>, addressee: impl Into<String>) -> Self {
        Self::MisaddressedEvent {
            entity: entity.into(),
            addressee: addressee.into(),
        }
    }

    pub fn not_found(entity_type: EntityType, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            key: key.into(),
        }
    }
}

impl From<config::ConfigError> for LifecycleError {
    fn from(err: config::ConfigError) -> Self {
        LifecycleError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
