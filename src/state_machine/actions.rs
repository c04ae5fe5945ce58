use super::events::{
    JobEvent, NodeEvent, NodeEventPayload, ServiceComponentHostEvent,
    ServiceComponentHostEventType,
};
use crate::models::job::JobTimeline;
use crate::models::node::NodeInfo;
use crate::models::service_component_host::ServiceComponentHostInfo;

/// Side effect attached to a single transition.
///
/// Runs synchronously, inside the owning entity's write lock, before the new
/// state is stored.
pub trait TransitionAction<O, E>: Send + Sync {
    /// Execute the action
    fn execute(&self, owner: &mut O, event: &E);

    /// Get a description of this action for logging
    fn description(&self) -> &'static str {
        "anonymous transition action"
    }
}

impl<O, E, F> TransitionAction<O, E> for F
where
    F: Fn(&mut O, &E) + Send + Sync,
{
    fn execute(&self, owner: &mut O, event: &E) {
        self(owner, event)
    }
}

/// Store the hardware facts reported with a registration request
pub struct RecordRegistrationAction;

impl TransitionAction<NodeInfo, NodeEvent> for RecordRegistrationAction {
    fn execute(&self, node: &mut NodeInfo, event: &NodeEvent) {
        if let NodeEventPayload::RegistrationRequest(host_info) = &event.payload {
            node.host_info = host_info.clone();
        }
        node.last_registration_time = Some(event.timestamp);
    }

    fn description(&self) -> &'static str {
        "Record host registration"
    }
}

/// Mark the host as verified
pub struct MarkVerifiedAction;

impl TransitionAction<NodeInfo, NodeEvent> for MarkVerifiedAction {
    fn execute(&self, node: &mut NodeInfo, event: &NodeEvent) {
        node.verified_at = Some(event.timestamp);
        tracing::info!(hostname = %event.hostname, "Host verified");
    }

    fn description(&self) -> &'static str {
        "Mark host verified"
    }
}

/// Track heartbeat arrival and the health reported with it
pub struct RecordHeartbeatAction;

impl TransitionAction<NodeInfo, NodeEvent> for RecordHeartbeatAction {
    fn execute(&self, node: &mut NodeInfo, event: &NodeEvent) {
        match &event.payload {
            NodeEventPayload::HeartbeatHealthy => {
                node.last_heartbeat_time = Some(event.timestamp);
                node.health_report = None;
            }
            NodeEventPayload::HeartbeatUnhealthy { reason } => {
                node.last_heartbeat_time = Some(event.timestamp);
                node.health_report = Some(reason.clone());
            }
            NodeEventPayload::HeartbeatTimedOut => {
                // No heartbeat arrived, so last_heartbeat_time stays as it was
                node.health_report = Some("heartbeat lost".to_string());
            }
            NodeEventPayload::RegistrationRequest(_) | NodeEventPayload::Verified => {}
        }
    }

    fn description(&self) -> &'static str {
        "Record host heartbeat"
    }
}

/// Stamp the start of a job run
pub struct StartJobAction;

impl TransitionAction<JobTimeline, JobEvent> for StartJobAction {
    fn execute(&self, timeline: &mut JobTimeline, event: &JobEvent) {
        timeline.started_at = Some(event.timestamp);
        timeline.finished_at = None;
        timeline.progress_updates = 0;
    }

    fn description(&self) -> &'static str {
        "Start job timeline"
    }
}

/// Count a progress ping on a running job
pub struct RecordJobProgressAction;

impl TransitionAction<JobTimeline, JobEvent> for RecordJobProgressAction {
    fn execute(&self, timeline: &mut JobTimeline, _event: &JobEvent) {
        timeline.progress_updates += 1;
    }

    fn description(&self) -> &'static str {
        "Record job progress"
    }
}

/// Stamp the outcome of a job run
pub struct FinishJobAction;

impl TransitionAction<JobTimeline, JobEvent> for FinishJobAction {
    fn execute(&self, timeline: &mut JobTimeline, event: &JobEvent) {
        timeline.finished_at = Some(event.timestamp);
    }

    fn description(&self) -> &'static str {
        "Finish job timeline"
    }
}

/// Clear the timeline when the slot is re-initialized
pub struct ResetJobAction;

impl TransitionAction<JobTimeline, JobEvent> for ResetJobAction {
    fn execute(&self, timeline: &mut JobTimeline, _event: &JobEvent) {
        *timeline = JobTimeline::default();
    }

    fn description(&self) -> &'static str {
        "Reset job timeline"
    }
}

/// Remember which operation was requested and when
pub struct BeginOperationAction;

impl TransitionAction<ServiceComponentHostInfo, ServiceComponentHostEvent>
    for BeginOperationAction
{
    fn execute(&self, info: &mut ServiceComponentHostInfo, event: &ServiceComponentHostEvent) {
        if event.kind != ServiceComponentHostEventType::OpRestart {
            info.last_operation = Some(event.kind);
        }
        info.last_operation_started_at = Some(event.timestamp);
        info.last_operation_finished_at = None;
        info.last_failure = None;
    }

    fn description(&self) -> &'static str {
        "Begin component operation"
    }
}

/// Record the outcome reported for the running operation
pub struct CompleteOperationAction;

impl TransitionAction<ServiceComponentHostInfo, ServiceComponentHostEvent>
    for CompleteOperationAction
{
    fn execute(&self, info: &mut ServiceComponentHostInfo, event: &ServiceComponentHostEvent) {
        info.last_operation_finished_at = Some(event.timestamp);
        info.last_failure = match event.kind {
            ServiceComponentHostEventType::OpFailed => Some(
                event
                    .message
                    .clone()
                    .unwrap_or_else(|| "operation failed".to_string()),
            ),
            _ => None,
        };
    }

    fn description(&self) -> &'static str {
        "Complete component operation"
    }
}

/// Forget all operation history when the component is wiped out
pub struct WipeoutAction;

impl TransitionAction<ServiceComponentHostInfo, ServiceComponentHostEvent> for WipeoutAction {
    fn execute(&self, info: &mut ServiceComponentHostInfo, _event: &ServiceComponentHostEvent) {
        *info = ServiceComponentHostInfo::default();
    }

    fn description(&self) -> &'static str {
        "Wipe out component history"
    }
}
