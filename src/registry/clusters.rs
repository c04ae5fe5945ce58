//! # Cluster Set
//!
//! Top-level registry of clusters keyed by name. Each cluster receives a
//! monotonically increasing numeric id at registration.

use super::cluster::Cluster;
use crate::config::LifecycleConfig;
use crate::error::{EntityType, LifecycleError, Result};
use crate::logging::log_registry_operation;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

const REGISTRY_LABEL: &str = "cluster set";

/// Registry of all clusters managed by this process
pub struct ClusterSet {
    clusters: RwLock<HashMap<String, Arc<Cluster>>>,
    next_cluster_id: AtomicU64,
}

impl ClusterSet {
    pub fn new() -> Self {
        Self {
            clusters: RwLock::new(HashMap::new()),
            next_cluster_id: AtomicU64::new(1),
        }
    }

    /// Build a cluster set holding every cluster named in the configuration
    pub fn from_config(config: &LifecycleConfig) -> Result<Self> {
        let set = Self::new();
        for name in &config.clusters {
            set.add_cluster(name)?;
        }

        info!(
            environment = %config.environment,
            clusters = set.len(),
            "Cluster set initialized from configuration"
        );
        Ok(set)
    }

    pub fn add_cluster(&self, cluster_name: &str) -> Result<Arc<Cluster>> {
        let mut clusters = self.clusters.write();
        if clusters.contains_key(cluster_name) {
            log_registry_operation(
                "add_cluster",
                REGISTRY_LABEL,
                cluster_name,
                "duplicate",
                None,
            );
            return Err(LifecycleError::duplicate(EntityType::Cluster, cluster_name));
        }

        // Ids are only drawn for clusters that are actually inserted
        let cluster_id = self.next_cluster_id.fetch_add(1, Ordering::Relaxed);
        let cluster = Arc::new(Cluster::new(cluster_id, cluster_name));
        clusters.insert(cluster_name.to_string(), Arc::clone(&cluster));
        drop(clusters);

        let details = format!("cluster_id={cluster_id}");
        log_registry_operation(
            "add_cluster",
            REGISTRY_LABEL,
            cluster_name,
            "added",
            Some(&details),
        );
        Ok(cluster)
    }

    pub fn get_cluster(&self, cluster_name: &str) -> Result<Arc<Cluster>> {
        self.clusters
            .read()
            .get(cluster_name)
            .cloned()
            .ok_or_else(|| LifecycleError::not_found(EntityType::Cluster, cluster_name))
    }

    pub fn get_cluster_by_id(&self, cluster_id: u64) -> Result<Arc<Cluster>> {
        self.clusters
            .read()
            .values()
            .find(|cluster| cluster.cluster_id() == cluster_id)
            .cloned()
            .ok_or_else(|| LifecycleError::not_found(EntityType::Cluster, cluster_id.to_string()))
    }

    /// Registered cluster names, sorted
    pub fn cluster_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clusters.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.clusters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.read().is_empty()
    }
}

impl Default for ClusterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClusterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSet")
            .field("clusters", &self.cluster_names())
            .finish()
    }
}
