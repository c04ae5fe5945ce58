use cluster_lifecycle::registry::{ClusterSet, ClusterSnapshot};
use cluster_lifecycle::state_machine::{
    NodeEvent, NodeState, ServiceComponentHostEvent, ServiceComponentHostEventType,
    ServiceComponentHostState,
};
use cluster_lifecycle::{EntityType, LifecycleError};
use std::sync::Arc;

#[test]
fn test_cluster_registration_flow() {
    let clusters = ClusterSet::new();
    let cluster = clusters.add_cluster("c1").unwrap();

    cluster.add_host("h1").unwrap();
    cluster.add_host("h2").unwrap();
    cluster
        .add_service_component_host("HDFS", "NAMENODE", "h1", false)
        .unwrap();
    cluster
        .add_service_component_host("HDFS", "HDFS_CLIENT", "h1", true)
        .unwrap();
    cluster
        .add_service_component_host("HDFS", "DATANODE", "h2", false)
        .unwrap();

    assert_eq!(cluster.host_names(), vec!["h1", "h2"]);
    let on_h1: Vec<String> = cluster
        .service_component_hosts_for_host("h1")
        .iter()
        .map(|sch| sch.service_component_name().to_string())
        .collect();
    assert_eq!(on_h1, vec!["HDFS_CLIENT", "NAMENODE"]);

    let looked_up = clusters.get_cluster("c1").unwrap();
    assert!(Arc::ptr_eq(&looked_up, &cluster));
    looked_up
        .handle_node_event("h1", &NodeEvent::registration_request("h1", Default::default()))
        .unwrap();
    assert_eq!(
        cluster.get_node_state("h1").unwrap(),
        NodeState::WaitingForVerification
    );
}

#[test]
fn test_missing_entities_report_not_found() {
    let clusters = ClusterSet::new();
    let cluster = clusters.add_cluster("c1").unwrap();
    cluster.add_host("h1").unwrap();

    assert_eq!(
        cluster
            .handle_node_event("h9", &NodeEvent::heartbeat_healthy("h9"))
            .unwrap_err(),
        LifecycleError::not_found(EntityType::Host, "h9")
    );
    assert_eq!(
        cluster
            .get_service_component_host_state("HDFS", "NAMENODE", "h1")
            .unwrap_err(),
        LifecycleError::not_found(EntityType::ServiceComponentHost, "HDFS/NAMENODE@h1")
    );
    assert!(cluster
        .set_service_component_host_state("HDFS", "NAMENODE", "h1", ServiceComponentHostState::Started)
        .is_err());
    assert!(clusters.get_cluster("c2").is_err());
}

#[test]
fn test_misrouted_events_leave_entities_untouched() {
    let clusters = ClusterSet::new();
    let cluster = clusters.add_cluster("c1").unwrap();
    cluster.add_host("h1").unwrap();
    cluster.add_host("h2").unwrap();
    cluster
        .add_service_component_host("HDFS", "DATANODE", "h1", false)
        .unwrap();

    let err = cluster
        .handle_node_event("h1", &NodeEvent::registration_request("h2", Default::default()))
        .unwrap_err();
    assert!(matches!(err, LifecycleError::MisaddressedEvent { .. }));
    assert_eq!(cluster.get_node_state("h1").unwrap(), NodeState::Init);
    assert_eq!(cluster.get_node_state("h2").unwrap(), NodeState::Init);

    let install =
        ServiceComponentHostEvent::new("DATANODE", "h2", ServiceComponentHostEventType::Install);
    let err = cluster
        .handle_service_component_host_event("HDFS", "DATANODE", "h1", &install)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Event addressed to service component host DATANODE@h2 delivered to service component host HDFS/DATANODE@h1"
    );
    assert_eq!(
        cluster
            .get_service_component_host_state("HDFS", "DATANODE", "h1")
            .unwrap(),
        ServiceComponentHostState::Init
    );
}

#[test]
fn test_components_need_a_registered_host() {
    let clusters = ClusterSet::new();
    let cluster = clusters.add_cluster("c1").unwrap();
    cluster.add_host("h1").unwrap();

    assert_eq!(
        cluster
            .add_service_component_host("HDFS", "NAMENODE", "ghost", false)
            .unwrap_err(),
        LifecycleError::not_found(EntityType::Host, "ghost")
    );
    assert!(cluster.snapshot().service_component_hosts.is_empty());

    cluster.add_host("ghost").unwrap();
    cluster
        .add_service_component_host("HDFS", "NAMENODE", "ghost", false)
        .unwrap();
    assert_eq!(cluster.service_component_hosts_for_host("ghost").len(), 1);
}

#[test]
fn test_duplicates_leave_existing_entity_untouched() {
    let clusters = ClusterSet::new();
    let cluster = clusters.add_cluster("c1").unwrap();
    let host = cluster.add_host("h1").unwrap();
    host.set_state(NodeState::Healthy);

    assert!(matches!(
        cluster.add_host("h1"),
        Err(LifecycleError::DuplicateEntity {
            entity_type: EntityType::Host,
            ..
        })
    ));
    assert_eq!(cluster.get_node_state("h1").unwrap(), NodeState::Healthy);

    cluster
        .add_service_component_host("HDFS", "NAMENODE", "h1", false)
        .unwrap();
    let err = cluster
        .add_service_component_host("HDFS", "NAMENODE", "h1", true)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Duplicate service component host: HDFS/NAMENODE@h1"
    );
    assert!(!cluster
        .get_service_component_host("HDFS", "NAMENODE", "h1")
        .unwrap()
        .is_client());
}

#[test]
fn test_snapshot_survives_serialization() {
    let clusters = ClusterSet::new();
    let cluster = clusters.add_cluster("c1").unwrap();
    cluster.add_host("h1").unwrap();
    cluster
        .add_service_component_host("HDFS", "NAMENODE", "h1", false)
        .unwrap();

    let install =
        ServiceComponentHostEvent::new("NAMENODE", "h1", ServiceComponentHostEventType::Install);
    cluster
        .handle_service_component_host_event("HDFS", "NAMENODE", "h1", &install)
        .unwrap();
    cluster.set_node_state("h1", NodeState::HeartbeatLost).unwrap();

    let json = serde_json::to_string(&cluster.snapshot()).unwrap();
    let snapshot: ClusterSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.hosts["h1"], NodeState::HeartbeatLost);

    let restored_set = ClusterSet::new();
    let restored = restored_set.add_cluster("c1").unwrap();
    restored.add_host("h1").unwrap();
    restored
        .add_service_component_host("HDFS", "NAMENODE", "h1", false)
        .unwrap();
    restored.restore(&snapshot).unwrap();

    assert_eq!(
        restored
            .get_service_component_host_state("HDFS", "NAMENODE", "h1")
            .unwrap(),
        ServiceComponentHostState::Installing
    );
    // Restored state is a valid starting point for further events
    let succeeded = ServiceComponentHostEvent::new(
        "NAMENODE",
        "h1",
        ServiceComponentHostEventType::OpSucceeded,
    );
    assert_eq!(
        restored
            .handle_service_component_host_event("HDFS", "NAMENODE", "h1", &succeeded)
            .unwrap(),
        ServiceComponentHostState::Installed
    );
}

#[test]
fn test_cluster_ids_are_unique() {
    let clusters = ClusterSet::new();
    let ids: Vec<u64> = ["a", "b", "c"]
        .iter()
        .map(|name| clusters.add_cluster(name).unwrap().cluster_id())
        .collect();

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(clusters.add_cluster("b").is_err());

    let next = clusters.add_cluster("d").unwrap();
    assert_eq!(next.cluster_id(), ids[2] + 1);
    assert_eq!(clusters.get_cluster_by_id(ids[1]).unwrap().cluster_name(), "b");
}
