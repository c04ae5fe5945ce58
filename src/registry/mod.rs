//! # Registries
//!
//! Membership registries for clusters and the entities they contain.
//!
//! ```text
//! ClusterSet
//! └── Cluster
//!     ├── Node                  (keyed by host name)
//!     └── ServiceComponentHost  (keyed by service / component / host)
//! ```
//!
//! Registries guard only their maps. They hand out `Arc` handles to live
//! entities and release the map lock before the entity is touched.
//!
//! ## Usage
//!
//! ```rust
//! use cluster_lifecycle::registry::ClusterSet;
//! use cluster_lifecycle::state_machine::{NodeEvent, NodeState};
//!
//! # fn example() -> cluster_lifecycle::Result<()> {
//! let clusters = ClusterSet::new();
//! let cluster = clusters.add_cluster("c1")?;
//! cluster.add_host("h1")?;
//!
//! let state = cluster.handle_node_event(
//!     "h1",
//!     &NodeEvent::registration_request("h1", Default::default()),
//! )?;
//! assert_eq!(state, NodeState::WaitingForVerification);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod cluster;
pub mod clusters;

pub use cluster::{Cluster, ClusterSnapshot, ServiceComponentHostStateRecord};
pub use clusters::ClusterSet;
