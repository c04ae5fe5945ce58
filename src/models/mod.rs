//! Lifecycle entities: hosts, jobs and service component hosts.
//!
//! Each entity owns its state machine and mutable attributes behind a single
//! reader/writer lock.

pub mod job;
pub mod node;
pub mod service_component_host;

// Re-export entities for easy access
pub use job::{Job, JobTimeline};
pub use node::{DiskInfo, HostInfo, Node, NodeInfo};
pub use service_component_host::{
    ServiceComponentHost, ServiceComponentHostInfo, ServiceComponentHostKey,
};
