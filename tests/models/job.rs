use cluster_lifecycle::models::{Job, Node, ServiceComponentHost};
use cluster_lifecycle::state_machine::{JobEventType, JobState};
use std::sync::Arc;
use uuid::Uuid;

#[test]
fn test_job_slot_is_reused_after_failure() {
    let job_id = Uuid::new_v4();
    let job = Job::with_id(job_id);
    assert_eq!(job.job_id(), job_id);

    job.handle_event(&job.event(JobEventType::InProgress)).unwrap();
    assert_eq!(
        job.handle_event(&job.event(JobEventType::Failed)).unwrap(),
        JobState::Failed
    );
    assert!(job.timeline().finished_at.is_some());

    // Pings are refused once the job has finished
    assert!(job.handle_event(&job.event(JobEventType::InProgress)).is_err());
    assert_eq!(job.state(), JobState::Failed);

    job.handle_event(&job.event(JobEventType::Init)).unwrap();
    job.handle_event(&job.event(JobEventType::InProgress)).unwrap();
    assert_eq!(
        job.handle_event(&job.event(JobEventType::Completed)).unwrap(),
        JobState::Completed
    );
}

#[test]
fn test_jobs_attach_to_hosts_and_components() {
    let node = Node::new("h1");
    let sch = ServiceComponentHost::new("HDFS", "DATANODE", "h1", false);
    let job = Arc::new(Job::new());

    node.add_job(Arc::clone(&job));
    sch.add_job(Arc::clone(&job));

    job.handle_event(&job.event(JobEventType::InProgress)).unwrap();

    // Both owners observe the same live job
    assert_eq!(node.jobs()[0].state(), JobState::InProgress);
    assert_eq!(sch.jobs()[0].state(), JobState::InProgress);
    assert_eq!(Arc::strong_count(&job), 3);
}
