//! # Cluster Registry
//!
//! Membership of hosts and service component hosts within one cluster.
//!
//! The membership maps sit behind a single lock per cluster. Lookups clone an
//! `Arc` handle out of the map and release the lock before any entity work, so
//! events for different entities never contend on the cluster.

use crate::error::{EntityType, LifecycleError, Result};
use crate::logging::log_registry_operation;
use crate::models::node::Node;
use crate::models::service_component_host::{ServiceComponentHost, ServiceComponentHostKey};
use crate::state_machine::events::{NodeEvent, ServiceComponentHostEvent};
use crate::state_machine::states::{NodeState, ServiceComponentHostState};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Persisted state of one service component host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceComponentHostStateRecord {
    pub service_name: String,
    pub service_component_name: String,
    pub host_name: String,
    pub state: ServiceComponentHostState,
}

/// Point-in-time states of every entity in a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub cluster_name: String,
    pub hosts: BTreeMap<String, NodeState>,
    pub service_component_hosts: Vec<ServiceComponentHostStateRecord>,
}

#[derive(Default)]
struct Membership {
    hosts: HashMap<String, Arc<Node>>,
    service_component_hosts: HashMap<ServiceComponentHostKey, Arc<ServiceComponentHost>>,
}

/// Named group of hosts and the service components placed on them
pub struct Cluster {
    cluster_id: u64,
    cluster_name: String,
    membership: RwLock<Membership>,
}

impl Cluster {
    pub fn new(cluster_id: u64, cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_id,
            cluster_name: cluster_name.into(),
            membership: RwLock::new(Membership::default()),
        }
    }

    pub fn cluster_id(&self) -> u64 {
        self.cluster_id
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    fn registry_label(&self) -> String {
        format!("cluster {}", self.cluster_name)
    }

    /// Register a new host in INIT
    pub fn add_host(&self, host_name: &str) -> Result<Arc<Node>> {
        let mut membership = self.membership.write();
        if membership.hosts.contains_key(host_name) {
            log_registry_operation(
                "add_host",
                &self.registry_label(),
                host_name,
                "duplicate",
                None,
            );
            return Err(LifecycleError::duplicate(EntityType::Host, host_name));
        }

        let node = Arc::new(Node::new(host_name));
        membership
            .hosts
            .insert(host_name.to_string(), Arc::clone(&node));
        drop(membership);

        log_registry_operation("add_host", &self.registry_label(), host_name, "added", None);
        Ok(node)
    }

    /// Register a service component on a host.
    ///
    /// The host must already be a member of this cluster.
    pub fn add_service_component_host(
        &self,
        service_name: &str,
        service_component_name: &str,
        host_name: &str,
        is_client: bool,
    ) -> Result<Arc<ServiceComponentHost>> {
        let key = ServiceComponentHostKey::new(service_name, service_component_name, host_name);
        let mut membership = self.membership.write();
        if !membership.hosts.contains_key(host_name) {
            log_registry_operation(
                "add_service_component_host",
                &self.registry_label(),
                &key.to_string(),
                "unknown_host",
                None,
            );
            return Err(LifecycleError::not_found(EntityType::Host, host_name));
        }
        if membership.service_component_hosts.contains_key(&key) {
            log_registry_operation(
                "add_service_component_host",
                &self.registry_label(),
                &key.to_string(),
                "duplicate",
                None,
            );
            return Err(LifecycleError::duplicate(
                EntityType::ServiceComponentHost,
                key.to_string(),
            ));
        }

        let sch = Arc::new(ServiceComponentHost::new(
            service_name,
            service_component_name,
            host_name,
            is_client,
        ));
        membership
            .service_component_hosts
            .insert(key.clone(), Arc::clone(&sch));
        drop(membership);

        log_registry_operation(
            "add_service_component_host",
            &self.registry_label(),
            &key.to_string(),
            "added",
            Some(if is_client { "client" } else { "daemon" }),
        );
        Ok(sch)
    }

    pub fn get_host(&self, host_name: &str) -> Result<Arc<Node>> {
        self.membership
            .read()
            .hosts
            .get(host_name)
            .cloned()
            .ok_or_else(|| LifecycleError::not_found(EntityType::Host, host_name))
    }

    pub fn get_service_component_host(
        &self,
        service_name: &str,
        service_component_name: &str,
        host_name: &str,
    ) -> Result<Arc<ServiceComponentHost>> {
        let key = ServiceComponentHostKey::new(service_name, service_component_name, host_name);
        self.get_service_component_host_by_key(&key)
    }

    fn get_service_component_host_by_key(
        &self,
        key: &ServiceComponentHostKey,
    ) -> Result<Arc<ServiceComponentHost>> {
        self.membership
            .read()
            .service_component_hosts
            .get(key)
            .cloned()
            .ok_or_else(|| {
                LifecycleError::not_found(EntityType::ServiceComponentHost, key.to_string())
            })
    }

    pub fn get_node_state(&self, host_name: &str) -> Result<NodeState> {
        Ok(self.get_host(host_name)?.state())
    }

    pub fn set_node_state(&self, host_name: &str, state: NodeState) -> Result<()> {
        self.get_host(host_name)?.set_state(state);
        Ok(())
    }

    pub fn get_service_component_host_state(
        &self,
        service_name: &str,
        service_component_name: &str,
        host_name: &str,
    ) -> Result<ServiceComponentHostState> {
        Ok(self
            .get_service_component_host(service_name, service_component_name, host_name)?
            .state())
    }

    pub fn set_service_component_host_state(
        &self,
        service_name: &str,
        service_component_name: &str,
        host_name: &str,
        state: ServiceComponentHostState,
    ) -> Result<()> {
        self.get_service_component_host(service_name, service_component_name, host_name)?
            .set_state(state);
        Ok(())
    }

    /// Route a host event to the named host
    pub fn handle_node_event(&self, host_name: &str, event: &NodeEvent) -> Result<NodeState> {
        let node = self.get_host(host_name)?;
        node.handle_event(event)
    }

    /// Route a component event to the addressed service component host
    pub fn handle_service_component_host_event(
        &self,
        service_name: &str,
        service_component_name: &str,
        host_name: &str,
        event: &ServiceComponentHostEvent,
    ) -> Result<ServiceComponentHostState> {
        let sch =
            self.get_service_component_host(service_name, service_component_name, host_name)?;
        sch.handle_event(event)
    }

    /// Registered host names, sorted
    pub fn host_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.membership.read().hosts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Service component hosts placed on `host_name`, ordered by key
    pub fn service_component_hosts_for_host(
        &self,
        host_name: &str,
    ) -> Vec<Arc<ServiceComponentHost>> {
        let mut matches: Vec<Arc<ServiceComponentHost>> = self
            .membership
            .read()
            .service_component_hosts
            .values()
            .filter(|sch| sch.host_name() == host_name)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.key().cmp(b.key()));
        matches
    }

    /// Capture the current state of every entity
    pub fn snapshot(&self) -> ClusterSnapshot {
        let (hosts, mut schs): (Vec<Arc<Node>>, Vec<Arc<ServiceComponentHost>>) = {
            let membership = self.membership.read();
            (
                membership.hosts.values().cloned().collect(),
                membership.service_component_hosts.values().cloned().collect(),
            )
        };
        schs.sort_by(|a, b| a.key().cmp(b.key()));

        ClusterSnapshot {
            cluster_name: self.cluster_name.clone(),
            hosts: hosts
                .iter()
                .map(|node| (node.hostname().to_string(), node.state()))
                .collect(),
            service_component_hosts: schs
                .iter()
                .map(|sch| ServiceComponentHostStateRecord {
                    service_name: sch.service_name().to_string(),
                    service_component_name: sch.service_component_name().to_string(),
                    host_name: sch.host_name().to_string(),
                    state: sch.state(),
                })
                .collect(),
        }
    }

    /// Apply persisted states without transition validation.
    ///
    /// Every referenced entity is resolved before any state is written, so an
    /// unknown host or component leaves the cluster untouched.
    pub fn restore(&self, snapshot: &ClusterSnapshot) -> Result<()> {
        let hosts = snapshot
            .hosts
            .iter()
            .map(|(name, state)| -> Result<_> { Ok((self.get_host(name)?, *state)) })
            .collect::<Result<Vec<_>>>()?;

        let schs = snapshot
            .service_component_hosts
            .iter()
            .map(|record| -> Result<_> {
                let key = ServiceComponentHostKey::new(
                    record.service_name.as_str(),
                    record.service_component_name.as_str(),
                    record.host_name.as_str(),
                );
                Ok((self.get_service_component_host_by_key(&key)?, record.state))
            })
            .collect::<Result<Vec<_>>>()?;

        for (node, state) in &hosts {
            node.set_state(*state);
        }
        for (sch, state) in &schs {
            sch.set_state(*state);
        }

        debug!(
            cluster = %self.cluster_name,
            hosts = hosts.len(),
            service_component_hosts = schs.len(),
            "Cluster states restored"
        );
        Ok(())
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let membership = self.membership.read();
        f.debug_struct("Cluster")
            .field("cluster_id", &self.cluster_id)
            .field("cluster_name", &self.cluster_name)
            .field("hosts", &membership.hosts.len())
            .field(
                "service_component_hosts",
                &membership.service_component_hosts.len(),
            )
            .finish()
    }
}
