//! # Node
//!
//! A physical host known to a cluster. The host lifecycle starts in INIT when
//! the host first contacts the server, waits for verification after
//! registration, and then moves between HEALTHY, UNHEALTHY and HEARTBEAT_LOST as
//! heartbeats arrive or stop arriving. No transition returns a host to INIT.

use super::job::Job;
use crate::error::{LifecycleError, Result};
use crate::logging::{
    log_invalid_transition, log_misaddressed_event, log_state_restored, log_state_transition,
};
use crate::state_machine::actions::{
    MarkVerifiedAction, RecordHeartbeatAction, RecordRegistrationAction, TransitionAction,
};
use crate::state_machine::errors::StateMachineResult;
use crate::state_machine::events::{NodeEvent, NodeEventType, StateMachineEvent};
use crate::state_machine::machine::StateMachine;
use crate::state_machine::states::NodeState;
use crate::state_machine::topology::{Topology, TopologyBuilder};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

pub type NodeTopology = Topology<NodeState, NodeEvent, NodeInfo>;

static NODE_TOPOLOGY: OnceLock<Arc<NodeTopology>> = OnceLock::new();

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub device: String,
    pub mount_point: String,
    pub size_kb: u64,
    pub available_kb: u64,
}

/// Hardware and network facts reported by a host when it registers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub ip_addresses: Vec<IpAddr>,
    pub cpu_count: u32,
    pub total_memory_kb: u64,
    pub disks: Vec<DiskInfo>,
    pub os_type: Option<String>,
}

/// Mutable host attributes maintained by the lifecycle actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub host_info: HostInfo,
    pub last_registration_time: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub last_heartbeat_time: Option<DateTime<Utc>>,
    /// Problem reported by the latest heartbeat, cleared by a healthy one
    pub health_report: Option<String>,
}

/// Build the host transition table
pub fn build_node_topology() -> StateMachineResult<NodeTopology> {
    use NodeEventType::*;
    use NodeState::*;

    let heartbeat: Arc<dyn TransitionAction<NodeInfo, NodeEvent>> = Arc::new(RecordHeartbeatAction);

    let mut builder = TopologyBuilder::<NodeState, NodeEvent, NodeInfo>::new(Init)
        .add_transition_with_action(
            Init,
            RegistrationRequest,
            WaitingForVerification,
            RecordRegistrationAction,
        )?
        .add_transition_with_action(WaitingForVerification, Verified, Healthy, MarkVerifiedAction)?;

    for from in [Healthy, Unhealthy, HeartbeatLost] {
        builder = builder
            .add_transition_with_shared_action(from, HeartbeatHealthy, Healthy, Arc::clone(&heartbeat))?
            .add_transition_with_shared_action(
                from,
                HeartbeatUnhealthy,
                Unhealthy,
                Arc::clone(&heartbeat),
            )?
            .add_transition_with_shared_action(
                from,
                HeartbeatTimedOut,
                HeartbeatLost,
                Arc::clone(&heartbeat),
            )?;
    }

    builder.install()
}

/// Shared host topology, built on first use
pub fn node_topology() -> &'static Arc<NodeTopology> {
    NODE_TOPOLOGY.get_or_init(|| {
        Arc::new(build_node_topology().expect("node lifecycle topology must be well formed"))
    })
}

struct NodeInner {
    state_machine: StateMachine<NodeState, NodeEvent, NodeInfo>,
    info: NodeInfo,
    jobs: Vec<Arc<Job>>,
}

/// Thread-safe host entity
pub struct Node {
    hostname: String,
    inner: RwLock<NodeInner>,
}

impl Node {
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        let state_machine = node_topology().make(format!("host {hostname}"));

        Self {
            hostname,
            inner: RwLock::new(NodeInner {
                state_machine,
                info: NodeInfo::default(),
                jobs: Vec::new(),
            }),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn state(&self) -> NodeState {
        self.inner.read().state_machine.current_state()
    }

    /// Overwrite the state without validation (snapshot restore)
    pub fn set_state(&self, state: NodeState) {
        let mut inner = self.inner.write();
        let previous = inner.state_machine.current_state();
        inner.state_machine.set_state(state);
        log_state_restored("host", &self.hostname, previous, state);
    }

    /// Apply an event under the write lock.
    ///
    /// On an invalid transition the state is unchanged and the error is returned.
    /// Events naming another host are rejected before the lock is taken.
    pub fn handle_event(&self, event: &NodeEvent) -> Result<NodeState> {
        if event.hostname != self.hostname {
            log_misaddressed_event("host", &self.hostname, &event.hostname, event.kind());
            return Err(LifecycleError::misaddressed(
                format!("host {}", self.hostname),
                format!("host {}", event.hostname),
            ));
        }

        let mut guard = self.inner.write();
        let NodeInner {
            state_machine,
            info,
            ..
        } = &mut *guard;
        let previous = state_machine.current_state();

        match state_machine.fire(info, event) {
            Ok(state) => {
                log_state_transition("host", &self.hostname, previous, state, event.kind());
                Ok(state)
            }
            Err(e) => {
                log_invalid_transition("host", &self.hostname, previous, event.kind());
                Err(e.into())
            }
        }
    }

    /// Snapshot of the mutable host attributes
    pub fn info(&self) -> NodeInfo {
        self.inner.read().info.clone()
    }

    pub fn last_heartbeat_time(&self) -> Option<DateTime<Utc>> {
        self.inner.read().info.last_heartbeat_time
    }

    pub fn add_job(&self, job: Arc<Job>) {
        self.inner.write().jobs.push(job);
    }

    pub fn jobs(&self) -> Vec<Arc<Job>> {
        self.inner.read().jobs.clone()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("hostname", &self.hostname)
            .field("state", &self.state())
            .finish()
    }
}
