use cluster_lifecycle::state_machine::{
    JobEvent, JobEventType, JobState, StateMachineError, TopologyBuilder, TransitionAction,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

type Log = Vec<(JobEventType, Uuid)>;

fn record(log: &mut Log, event: &JobEvent) {
    log.push((event.kind, event.job_id));
}

#[test]
fn test_action_runs_once_per_fire() {
    let topology = TopologyBuilder::<JobState, JobEvent, Log>::new(JobState::Init)
        .add_transition_with_action(JobState::Init, JobEventType::InProgress, JobState::InProgress, record)
        .unwrap()
        .add_transition_with_action(
            JobState::InProgress,
            JobEventType::InProgress,
            JobState::InProgress,
            record,
        )
        .unwrap()
        .install()
        .unwrap();

    let mut machine = Arc::new(topology).make("recorder");
    let mut log = Log::new();
    let job_id = Uuid::new_v4();

    for _ in 0..3 {
        machine
            .fire(&mut log, &JobEvent::new(job_id, JobEventType::InProgress))
            .unwrap();
    }

    assert_eq!(log.len(), 3);
    assert!(log
        .iter()
        .all(|(kind, id)| *kind == JobEventType::InProgress && *id == job_id));
    assert_eq!(machine.current_state(), JobState::InProgress);
}

#[test]
fn test_invalid_transition_skips_action_and_keeps_state() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let topology = TopologyBuilder::<JobState, JobEvent, ()>::new(JobState::Init)
        .add_transition_with_action(
            JobState::Init,
            JobEventType::InProgress,
            JobState::InProgress,
            move |_: &mut (), _: &JobEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap()
        .install()
        .unwrap();

    let mut machine = Arc::new(topology).make("job j1");
    let err = machine
        .fire(&mut (), &JobEvent::new(Uuid::new_v4(), JobEventType::Completed))
        .unwrap_err();

    assert_eq!(
        err,
        StateMachineError::InvalidTransition {
            entity: "job j1".to_string(),
            current_state: "init".to_string(),
            event_kind: "job_completed".to_string(),
        }
    );
    assert_eq!(machine.current_state(), JobState::Init);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_topology_is_rejected() {
    let err = TopologyBuilder::<JobState, JobEvent, ()>::new(JobState::Init)
        .install()
        .unwrap_err();
    assert!(matches!(err, StateMachineError::MalformedTopology { .. }));
}

#[test]
fn test_duplicate_row_is_rejected() {
    let result = TopologyBuilder::<JobState, JobEvent, ()>::new(JobState::Init)
        .add_transition(JobState::Init, JobEventType::InProgress, JobState::InProgress)
        .and_then(|b| b.add_transition(JobState::Init, JobEventType::InProgress, JobState::Failed));

    match result {
        Err(StateMachineError::MalformedTopology { reason }) => {
            assert!(reason.contains("duplicate transition"));
        }
        other => panic!("Expected malformed topology, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unreachable_state_is_rejected() {
    let err = TopologyBuilder::<JobState, JobEvent, ()>::new(JobState::Init)
        .add_transition(JobState::Init, JobEventType::InProgress, JobState::InProgress)
        .unwrap()
        .add_transition(JobState::Failed, JobEventType::Init, JobState::Init)
        .unwrap()
        .install()
        .unwrap_err();

    match err {
        StateMachineError::MalformedTopology { reason } => assert!(reason.contains("failed")),
        other => panic!("Expected malformed topology, got {other:?}"),
    }
}

#[test]
fn test_shared_action_description() {
    struct Named;

    impl TransitionAction<(), JobEvent> for Named {
        fn execute(&self, _: &mut (), _: &JobEvent) {}

        fn description(&self) -> &'static str {
            "named action"
        }
    }

    let shared: Arc<dyn TransitionAction<(), JobEvent>> = Arc::new(Named);
    let topology = TopologyBuilder::<JobState, JobEvent, ()>::new(JobState::Init)
        .add_transition_with_shared_action(
            JobState::Init,
            JobEventType::InProgress,
            JobState::InProgress,
            Arc::clone(&shared),
        )
        .unwrap()
        .add_transition_with_shared_action(
            JobState::InProgress,
            JobEventType::Completed,
            JobState::Completed,
            shared,
        )
        .unwrap()
        .install()
        .unwrap();

    assert!(topology
        .transitions()
        .all(|t| t.action().map(|a| a.description()) == Some("named action")));
    assert_eq!(
        topology.target_state(JobState::InProgress, JobEventType::Completed),
        Some(JobState::Completed)
    );
    assert_eq!(
        topology.target_state(JobState::Completed, JobEventType::Init),
        None
    );
}
