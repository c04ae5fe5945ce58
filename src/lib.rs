#![allow(clippy::doc_markdown)] // Allow technical terms like NAMENODE, HDFS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Cluster Lifecycle Core
//!
//! Lifecycle state management for the hosts, jobs and service components of a
//! cluster-management server.
//!
//! ## Overview
//!
//! Every managed entity is driven by a finite state machine. A topology (the
//! transition table for one kind of entity) is built once, validated, and shared
//! by all entities of that kind. Entities apply events under their own
//! reader/writer lock, so concurrent events for one entity are serialized while
//! events for different entities proceed in parallel.
//!
//! ## Key Features
//!
//! - **Generic engine**: typed states, events and transition actions
//! - **Host lifecycle**: registration, verification and heartbeat health
//! - **Job lifecycle**: reusable slots that reset after completion or failure
//! - **Service component lifecycle**: daemon and client variants
//! - **Registries**: clusters and cluster sets with uniqueness guarantees
//! - **Snapshots**: capture and restore the states of a whole cluster
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Topology builder, runtime machine, states, events, actions
//! - [`models`] - Node, Job and ServiceComponentHost entities
//! - [`registry`] - Cluster and ClusterSet registries
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use cluster_lifecycle::registry::ClusterSet;
//! use cluster_lifecycle::state_machine::{
//!     ServiceComponentHostEvent, ServiceComponentHostEventType, ServiceComponentHostState,
//! };
//!
//! # fn example() -> cluster_lifecycle::Result<()> {
//! let clusters = ClusterSet::new();
//! let cluster = clusters.add_cluster("c1")?;
//! cluster.add_host("h1")?;
//! cluster.add_service_component_host("HDFS", "NAMENODE", "h1", false)?;
//!
//! let install = ServiceComponentHostEvent::new("NAMENODE", "h1", ServiceComponentHostEventType::Install);
//! let state = cluster.handle_service_component_host_event("HDFS", "NAMENODE", "h1", &install)?;
//! assert_eq!(state, ServiceComponentHostState::Installing);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;
pub mod state_machine;

pub use config::{LifecycleConfig, LogFormat, LoggingConfig};
pub use error::{EntityType, LifecycleError, Result};
pub use models::{Job, Node, ServiceComponentHost};
pub use registry::{Cluster, ClusterSet, ClusterSnapshot};
pub use state_machine::{
    JobState, NodeState, ServiceComponentHostState, StateMachine, StateMachineError, Topology,
    TopologyBuilder,
};
