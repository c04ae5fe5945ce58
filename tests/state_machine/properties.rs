//! Table-wide transition properties for the built-in topologies

use cluster_lifecycle::models::job::job_topology;
use cluster_lifecycle::models::node::node_topology;
use cluster_lifecycle::models::service_component_host::{client_topology, daemon_topology};
use cluster_lifecycle::models::{Job, Node, ServiceComponentHost};
use cluster_lifecycle::state_machine::{
    JobEventType, JobState, NodeEvent, NodeEventType, NodeState, ServiceComponentHostEventType,
    ServiceComponentHostState,
};
use cluster_lifecycle::LifecycleError;
use proptest::prelude::*;

fn node_event(kind: NodeEventType) -> NodeEvent {
    match kind {
        NodeEventType::RegistrationRequest => NodeEvent::registration_request("h1", Default::default()),
        NodeEventType::Verified => NodeEvent::verified("h1"),
        NodeEventType::HeartbeatHealthy => NodeEvent::heartbeat_healthy("h1"),
        NodeEventType::HeartbeatTimedOut => NodeEvent::heartbeat_timed_out("h1"),
        NodeEventType::HeartbeatUnhealthy => NodeEvent::heartbeat_unhealthy("h1", "disk full"),
    }
}

fn node_state() -> impl Strategy<Value = NodeState> {
    prop::sample::select(NodeState::ALL.to_vec())
}

fn node_event_type() -> impl Strategy<Value = NodeEventType> {
    prop::sample::select(NodeEventType::ALL.to_vec())
}

fn job_state() -> impl Strategy<Value = JobState> {
    prop::sample::select(JobState::ALL.to_vec())
}

fn job_event_type() -> impl Strategy<Value = JobEventType> {
    prop::sample::select(JobEventType::ALL.to_vec())
}

fn component_state() -> impl Strategy<Value = ServiceComponentHostState> {
    prop::sample::select(ServiceComponentHostState::ALL.to_vec())
}

fn component_event_type() -> impl Strategy<Value = ServiceComponentHostEventType> {
    prop::sample::select(ServiceComponentHostEventType::ALL.to_vec())
}

proptest! {
    /// Property: a host either follows its table row or refuses and stays put
    #[test]
    fn node_fire_matches_table(state in node_state(), kind in node_event_type()) {
        let node = Node::new("h1");
        node.set_state(state);

        match (node_topology().target_state(state, kind), node.handle_event(&node_event(kind))) {
            (Some(expected), Ok(actual)) => {
                prop_assert_eq!(expected, actual);
                prop_assert_eq!(node.state(), expected);
            }
            (None, Err(LifecycleError::InvalidTransition { .. })) => {
                prop_assert_eq!(node.state(), state);
            }
            (expected, actual) => {
                prop_assert!(false, "table says {:?}, entity returned {:?}", expected, actual);
            }
        }
    }

    /// Property: a job either follows its table row or refuses and stays put
    #[test]
    fn job_fire_matches_table(state in job_state(), kind in job_event_type()) {
        let job = Job::new();
        job.set_state(state);

        match (job_topology().target_state(state, kind), job.handle_event(&job.event(kind))) {
            (Some(expected), Ok(actual)) => {
                prop_assert_eq!(expected, actual);
                prop_assert_eq!(job.state(), expected);
            }
            (None, Err(LifecycleError::InvalidTransition { .. })) => {
                prop_assert_eq!(job.state(), state);
            }
            (expected, actual) => {
                prop_assert!(false, "table says {:?}, entity returned {:?}", expected, actual);
            }
        }
    }

    /// Property: both component variants follow their own table
    #[test]
    fn component_fire_matches_table(
        state in component_state(),
        kind in component_event_type(),
        is_client in any::<bool>(),
    ) {
        let sch = ServiceComponentHost::new("HDFS", "NAMENODE", "h1", is_client);
        let topology = if is_client { client_topology() } else { daemon_topology() };
        sch.set_state(state);

        match (topology.target_state(state, kind), sch.handle_event(&sch.event(kind))) {
            (Some(expected), Ok(actual)) => {
                prop_assert_eq!(expected, actual);
                prop_assert_eq!(sch.state(), expected);
            }
            (None, Err(LifecycleError::InvalidTransition { .. })) => {
                prop_assert_eq!(sch.state(), state);
            }
            (expected, actual) => {
                prop_assert!(false, "table says {:?}, entity returned {:?}", expected, actual);
            }
        }
    }

    /// Property: a client component never leaves INSTALLED on START
    #[test]
    fn client_never_starts(history in prop::collection::vec(component_event_type(), 0..20)) {
        let sch = ServiceComponentHost::new("HDFS", "HDFS_CLIENT", "h1", true);
        for kind in history {
            let _ = sch.handle_event(&sch.event(kind));
            prop_assert!(!matches!(
                sch.state(),
                ServiceComponentHostState::Starting | ServiceComponentHostState::Started
            ));
        }

        sch.set_state(ServiceComponentHostState::Installed);
        let result = sch.handle_event(&sch.event(ServiceComponentHostEventType::Start));
        prop_assert!(matches!(result, Err(LifecycleError::InvalidTransition { .. })), "unexpected {:?}", result);
        prop_assert_eq!(sch.state(), ServiceComponentHostState::Installed);
    }

    /// Property: a finished job always returns to INIT on re-init
    #[test]
    fn job_reinit_after_finish(
        pings in 0usize..10,
        failed in any::<bool>(),
    ) {
        let job = Job::new();
        job.handle_event(&job.event(JobEventType::InProgress)).unwrap();
        for _ in 0..pings {
            job.handle_event(&job.event(JobEventType::InProgress)).unwrap();
        }
        prop_assert_eq!(job.timeline().progress_updates, pings as u64);

        let outcome = if failed { JobEventType::Failed } else { JobEventType::Completed };
        let finished = job.handle_event(&job.event(outcome)).unwrap();
        prop_assert!(finished.is_finished());

        prop_assert_eq!(job.handle_event(&job.event(JobEventType::Init)).unwrap(), JobState::Init);
        prop_assert_eq!(job.timeline().progress_updates, 0);
    }

    /// Property: any event sequence leaves a host in the state obtained by replaying the table
    #[test]
    fn node_sequence_matches_replay(history in prop::collection::vec(node_event_type(), 0..30)) {
        let node = Node::new("h1");
        let mut expected = node_topology().initial_state();

        for kind in history {
            let outcome = node.handle_event(&node_event(kind));
            match node_topology().target_state(expected, kind) {
                Some(next) => {
                    prop_assert_eq!(outcome.ok(), Some(next));
                    expected = next;
                }
                None => prop_assert!(outcome.is_err()),
            }
            prop_assert_eq!(node.state(), expected);
        }
    }
}

#[test]
fn test_built_in_topologies_start_in_init_and_skip_wipeout_states() {
    for topology in [daemon_topology(), client_topology()] {
        for transition in topology.transitions() {
            assert_ne!(transition.from_state(), ServiceComponentHostState::WipingOut);
            assert_ne!(transition.to_state(), ServiceComponentHostState::WipeoutFailed);
        }
        assert_eq!(topology.initial_state(), ServiceComponentHostState::Init);
    }
    assert_eq!(node_topology().initial_state(), NodeState::Init);
    assert_eq!(job_topology().initial_state(), JobState::Init);
}
