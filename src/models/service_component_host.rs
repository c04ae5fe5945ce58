//! # Service Component Host
//!
//! One service component (e.g. `HDFS/NAMENODE`) placed on one host.
//!
//! Two topologies exist over the same state and event vocabulary:
//!
//! - **daemon**: long-running components with install, start, stop and
//!   uninstall branches
//! - **client**: one-shot components that are only installed and uninstalled;
//!   START is never accepted
//!
//! The variant is chosen at construction and never changes. WIPING_OUT and
//! WIPEOUT_FAILED are part of the state vocabulary, but no transition in either
//! topology enters or leaves them.

use super::job::Job;
use crate::error::{LifecycleError, Result};
use crate::logging::{
    log_invalid_transition, log_misaddressed_event, log_state_restored, log_state_transition,
};
use crate::state_machine::actions::{BeginOperationAction, CompleteOperationAction, WipeoutAction};
use crate::state_machine::errors::StateMachineResult;
use crate::state_machine::events::{
    ServiceComponentHostEvent, ServiceComponentHostEventType, StateMachineEvent,
};
use crate::state_machine::machine::StateMachine;
use crate::state_machine::states::ServiceComponentHostState;
use crate::state_machine::topology::{Topology, TopologyBuilder};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

pub type ServiceComponentHostTopology =
    Topology<ServiceComponentHostState, ServiceComponentHostEvent, ServiceComponentHostInfo>;

type ServiceComponentHostTopologyBuilder = TopologyBuilder<
    ServiceComponentHostState,
    ServiceComponentHostEvent,
    ServiceComponentHostInfo,
>;

static DAEMON_TOPOLOGY: OnceLock<Arc<ServiceComponentHostTopology>> = OnceLock::new();
static CLIENT_TOPOLOGY: OnceLock<Arc<ServiceComponentHostTopology>> = OnceLock::new();

/// Operation history maintained by the lifecycle actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceComponentHostInfo {
    /// Last command issued (INSTALL, START, STOP, UNINSTALL); retries keep the original
    pub last_operation: Option<ServiceComponentHostEventType>,
    pub last_operation_started_at: Option<DateTime<Utc>>,
    pub last_operation_finished_at: Option<DateTime<Utc>>,
    pub last_failure: Option<String>,
}

/// Registry key of a service component host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceComponentHostKey {
    pub service_name: String,
    pub service_component_name: String,
    pub host_name: String,
}

impl ServiceComponentHostKey {
    pub fn new(
        service_name: impl Into<String>,
        service_component_name: impl Into<String>,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_component_name: service_component_name.into(),
            host_name: host_name.into(),
        }
    }
}

impl fmt::Display for ServiceComponentHostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}",
            self.service_name, self.service_component_name, self.host_name
        )
    }
}

/// Install and uninstall branches shared by both variants
fn with_install_and_uninstall(
    builder: ServiceComponentHostTopologyBuilder,
) -> StateMachineResult<ServiceComponentHostTopologyBuilder> {
    use ServiceComponentHostEventType::*;
    use ServiceComponentHostState::*;

    builder
        .add_transition_with_action(Init, Install, Installing, BeginOperationAction)?
        .add_transition(Installing, OpInProgress, Installing)?
        .add_transition_with_action(Installing, OpSucceeded, Installed, CompleteOperationAction)?
        .add_transition_with_action(Installing, OpFailed, InstallFailed, CompleteOperationAction)?
        .add_transition_with_action(InstallFailed, OpRestart, Installing, BeginOperationAction)?
        .add_transition_with_action(Installed, Uninstall, Uninstalling, BeginOperationAction)?
        .add_transition_with_action(Installed, Install, Installing, BeginOperationAction)?
        .add_transition(Uninstalling, OpInProgress, Uninstalling)?
        .add_transition_with_action(
            Uninstalling,
            OpSucceeded,
            Uninstalled,
            CompleteOperationAction,
        )?
        .add_transition_with_action(
            Uninstalling,
            OpFailed,
            UninstallFailed,
            CompleteOperationAction,
        )?
        .add_transition_with_action(UninstallFailed, OpRestart, Uninstalling, BeginOperationAction)?
        .add_transition_with_action(Uninstalled, Install, Installing, BeginOperationAction)?
        .add_transition_with_action(Uninstalled, Wipeout, Init, WipeoutAction)
}

/// Build the transition table for long-running components
pub fn build_daemon_topology() -> StateMachineResult<ServiceComponentHostTopology> {
    use ServiceComponentHostEventType::*;
    use ServiceComponentHostState::*;

    with_install_and_uninstall(ServiceComponentHostTopologyBuilder::new(Init))?
        .add_transition_with_action(Installed, Start, Starting, BeginOperationAction)?
        .add_transition(Starting, OpInProgress, Starting)?
        .add_transition_with_action(Starting, OpSucceeded, Started, CompleteOperationAction)?
        .add_transition_with_action(Starting, OpFailed, StartFailed, CompleteOperationAction)?
        .add_transition_with_action(StartFailed, OpRestart, Starting, BeginOperationAction)?
        .add_transition_with_action(Started, Stop, Stopping, BeginOperationAction)?
        .add_transition(Stopping, OpInProgress, Stopping)?
        .add_transition_with_action(Stopping, OpSucceeded, Installed, CompleteOperationAction)?
        .add_transition_with_action(Stopping, OpFailed, StopFailed, CompleteOperationAction)?
        .add_transition_with_action(StopFailed, OpRestart, Stopping, BeginOperationAction)?
        .install()
}

/// Build the transition table for client-only components
pub fn build_client_topology() -> StateMachineResult<ServiceComponentHostTopology> {
    with_install_and_uninstall(ServiceComponentHostTopologyBuilder::new(
        ServiceComponentHostState::Init,
    ))?
    .install()
}

/// Shared daemon topology, built on first use
pub fn daemon_topology() -> &'static Arc<ServiceComponentHostTopology> {
    DAEMON_TOPOLOGY.get_or_init(|| {
        Arc::new(build_daemon_topology().expect("daemon component topology must be well formed"))
    })
}

/// Shared client topology, built on first use
pub fn client_topology() -> &'static Arc<ServiceComponentHostTopology> {
    CLIENT_TOPOLOGY.get_or_init(|| {
        Arc::new(build_client_topology().expect("client component topology must be well formed"))
    })
}

struct ServiceComponentHostInner {
    state_machine:
        StateMachine<ServiceComponentHostState, ServiceComponentHostEvent, ServiceComponentHostInfo>,
    info: ServiceComponentHostInfo,
    jobs: Vec<Arc<Job>>,
}

/// Thread-safe service component host entity
pub struct ServiceComponentHost {
    key: ServiceComponentHostKey,
    is_client: bool,
    inner: RwLock<ServiceComponentHostInner>,
}

impl ServiceComponentHost {
    pub fn new(
        service_name: impl Into<String>,
        service_component_name: impl Into<String>,
        host_name: impl Into<String>,
        is_client: bool,
    ) -> Self {
        let key = ServiceComponentHostKey::new(service_name, service_component_name, host_name);
        let topology = if is_client {
            client_topology()
        } else {
            daemon_topology()
        };

        Self {
            inner: RwLock::new(ServiceComponentHostInner {
                state_machine: topology.make(format!("service component host {key}")),
                info: ServiceComponentHostInfo::default(),
                jobs: Vec::new(),
            }),
            key,
            is_client,
        }
    }

    pub fn key(&self) -> &ServiceComponentHostKey {
        &self.key
    }

    pub fn service_name(&self) -> &str {
        &self.key.service_name
    }

    pub fn service_component_name(&self) -> &str {
        &self.key.service_component_name
    }

    pub fn host_name(&self) -> &str {
        &self.key.host_name
    }

    pub fn is_client(&self) -> bool {
        self.is_client
    }

    pub fn state(&self) -> ServiceComponentHostState {
        self.inner.read().state_machine.current_state()
    }

    /// Overwrite the state without validation (snapshot restore)
    pub fn set_state(&self, state: ServiceComponentHostState) {
        let mut inner = self.inner.write();
        let previous = inner.state_machine.current_state();
        inner.state_machine.set_state(state);
        log_state_restored(
            "service_component_host",
            &self.key.to_string(),
            previous,
            state,
        );
    }

    /// Apply an event under the write lock.
    ///
    /// Invalid transitions are logged with the component identity and returned
    /// to the caller; the state is left as it was.
    pub fn handle_event(
        &self,
        event: &ServiceComponentHostEvent,
    ) -> Result<ServiceComponentHostState> {
        if event.service_component != self.key.service_component_name
            || event.host_name != self.key.host_name
        {
            let addressee = format!("{}@{}", event.service_component, event.host_name);
            log_misaddressed_event(
                "service_component_host",
                &self.key.to_string(),
                &addressee,
                event.kind(),
            );
            return Err(LifecycleError::misaddressed(
                format!("service component host {}", self.key),
                format!("service component host {addressee}"),
            ));
        }

        let mut guard = self.inner.write();
        let ServiceComponentHostInner {
            state_machine,
            info,
            ..
        } = &mut *guard;
        let previous = state_machine.current_state();

        match state_machine.fire(info, event) {
            Ok(state) => {
                log_state_transition(
                    "service_component_host",
                    &self.key.to_string(),
                    previous,
                    state,
                    event.kind(),
                );
                Ok(state)
            }
            Err(e) => {
                log_invalid_transition(
                    "service_component_host",
                    &self.key.to_string(),
                    previous,
                    event.kind(),
                );
                Err(e.into())
            }
        }
    }

    /// Build an event addressed to this component
    pub fn event(&self, kind: ServiceComponentHostEventType) -> ServiceComponentHostEvent {
        ServiceComponentHostEvent::new(
            self.key.service_component_name.clone(),
            self.key.host_name.clone(),
            kind,
        )
    }

    pub fn info(&self) -> ServiceComponentHostInfo {
        self.inner.read().info.clone()
    }

    pub fn add_job(&self, job: Arc<Job>) {
        self.inner.write().jobs.push(job);
    }

    pub fn jobs(&self) -> Vec<Arc<Job>> {
        self.inner.read().jobs.clone()
    }
}

impl fmt::Debug for ServiceComponentHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceComponentHost")
            .field("key", &self.key)
            .field("is_client", &self.is_client)
            .field("state", &self.state())
            .finish()
    }
}
